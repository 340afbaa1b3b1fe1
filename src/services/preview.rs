// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser thumbnails: a 200×140 SVG of the route, or a labelled
//! placeholder for activities without GPS.

use std::fmt::Write as _;

use crate::models::{Activity, ActivityType};
use crate::services::polyline;
use crate::services::projection::{project, Viewport};

/// Accent colors for a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub start: &'static str,
    pub mid: &'static str,
    pub end: &'static str,
    pub glow: &'static str,
}

impl Palette {
    pub fn for_type(kind: &ActivityType) -> Self {
        match kind {
            ActivityType::Run | ActivityType::TrailRun | ActivityType::VirtualRun => Palette {
                start: "#f97316",
                mid: "#ef4444",
                end: "#7c2d12",
                glow: "#f97316",
            },
            ActivityType::Ride => Palette {
                start: "#3b82f6",
                mid: "#06b6d4",
                end: "#1e3a5a",
                glow: "#3b82f6",
            },
            ActivityType::Hike => Palette {
                start: "#10b981",
                mid: "#14b8a6",
                end: "#064e3b",
                glow: "#10b981",
            },
            ActivityType::Other(_) => Palette {
                start: "#a855f7",
                mid: "#ec4899",
                end: "#581c87",
                glow: "#a855f7",
            },
        }
    }
}

/// Thumbnail SVG for an activity.
pub fn thumbnail_svg(activity: &Activity) -> String {
    let palette = Palette::for_type(&activity.activity_type);
    let viewport = Viewport::thumbnail();

    let path = activity
        .route()
        .map(|encoded| project(&polyline::decode(encoded), viewport))
        .filter(|path| !path.is_empty());

    let mut svg = String::with_capacity(1024);
    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><defs><linearGradient id="bg" x1="0%" y1="0%" x2="100%" y2="100%"><stop offset="0%" stop-color="#111827"/><stop offset="50%" stop-color="#1f2937"/><stop offset="100%" stop-color="#111827"/></linearGradient></defs><rect width="{w}" height="{h}" fill="url(#bg)"/>"##,
        w = viewport.width,
        h = viewport.height,
    );

    match path {
        Some(path) => {
            let d = path.to_svg_path();
            let _ = write!(
                svg,
                r##"<defs><linearGradient id="route" x1="0%" y1="0%" x2="100%" y2="100%"><stop offset="0%" stop-color="{start}"/><stop offset="50%" stop-color="{mid}"/><stop offset="100%" stop-color="{start}"/></linearGradient><filter id="glow"><feGaussianBlur stdDeviation="3" result="blur"/><feMerge><feMergeNode in="blur"/><feMergeNode in="SourceGraphic"/></feMerge></filter></defs><path d="{d}" fill="none" stroke="{glow}" stroke-width="6" stroke-linecap="round" stroke-linejoin="round" opacity="0.3" filter="url(#glow)"/><path d="{d}" fill="none" stroke="url(#route)" stroke-width="2.5" stroke-linecap="round" stroke-linejoin="round"/>"##,
                start = palette.start,
                mid = palette.mid,
                glow = palette.glow,
                d = d,
            );
            if let Some(p) = path.start() {
                let _ = write!(
                    svg,
                    r##"<circle cx="{x:.1}" cy="{y:.1}" r="5" fill="{c}"/><circle cx="{x:.1}" cy="{y:.1}" r="3" fill="#ffffff"/>"##,
                    x = p.x,
                    y = p.y,
                    c = palette.start,
                );
            }
        }
        None => {
            let label = if activity.is_treadmill() {
                "Indoor Run"
            } else {
                "No GPS"
            };
            let _ = write!(
                svg,
                r#"<rect x="72" y="36" width="56" height="56" rx="16" fill="{c}" fill-opacity="0.08" stroke="{c}" stroke-opacity="0.25" stroke-width="2"/><text x="100" y="112" text-anchor="middle" font-family="sans-serif" font-size="10" font-weight="600" letter-spacing="2" fill="{c}">{label}</text>"#,
                c = palette.start,
                label = label.to_uppercase(),
            );
        }
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity(kind: &str, polyline: &str) -> Activity {
        serde_json::from_value(json!({
            "id": 1,
            "name": "x",
            "type": kind,
            "map": { "summary_polyline": polyline }
        }))
        .unwrap()
    }

    #[test]
    fn test_route_thumbnail() {
        let svg = thumbnail_svg(&activity("Run", "_p~iF~ps|U_ulLnnqC_mqNvxq`@"));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"viewBox="0 0 200 140""#));
        assert_eq!(svg.matches("<path d=\"M").count(), 2);
        assert!(svg.contains(r##"fill="#f97316""##));
        assert!(!svg.contains("NO GPS"));
    }

    #[test]
    fn test_treadmill_placeholder() {
        let svg = thumbnail_svg(&activity("VirtualRun", ""));
        assert!(svg.contains("INDOOR RUN"));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_no_gps_placeholder() {
        let svg = thumbnail_svg(&activity("Ride", ""));
        assert!(svg.contains("NO GPS"));
        assert!(svg.contains("#3b82f6"));
    }

    #[test]
    fn test_undecodable_route_falls_back() {
        let svg = thumbnail_svg(&activity("Hike", "\u{1}"));
        assert!(svg.contains("NO GPS"));
    }
}
