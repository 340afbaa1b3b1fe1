// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fit a decoded route into a fixed-size viewport.
//!
//! Longitude maps to `x` and latitude to `y`, with `y` flipped so north is
//! up in a top-left-origin drawing space. One uniform scale (the smaller of
//! the two axis fits) keeps the aspect ratio, and the route is centered
//! with equal margins on the slack axis.

use geo::{BoundingRect, Coord, LineString, Rect};
use serde::Serialize;
use std::fmt::Write as _;

use crate::services::polyline::LatLng;

/// Range substituted for a zero-width axis (straight N-S / E-W routes and
/// single points), in degrees.
pub const MIN_RANGE_DEGREES: f64 = 0.001;

/// Target drawing area in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, padding: f64) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    /// Thumbnail size used by the activity browser.
    pub fn thumbnail() -> Self {
        Self::new(200.0, 140.0, 15.0)
    }
}

/// Pixel-space point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Route projected into a viewport.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectedPath {
    pub viewport: Viewport,
    pub points: Vec<Point>,
}

impl ProjectedPath {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// SVG path data: `M x,y L x,y ...` with one decimal.
    pub fn to_svg_path(&self) -> String {
        let mut d = String::with_capacity(self.points.len() * 12);
        for (i, p) in self.points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{}{:.1},{:.1}", cmd, p.x, p.y);
        }
        d
    }
}

/// Geographic bounding box (`x` = longitude, `y` = latitude).
pub fn bounds(coords: &[LatLng]) -> Option<Rect<f64>> {
    let line: LineString<f64> = coords.iter().copied().map(Coord::from).collect();
    line.bounding_rect()
}

/// Project a coordinate sequence into `viewport`.
pub fn project(coords: &[LatLng], viewport: Viewport) -> ProjectedPath {
    let Some(rect) = bounds(coords) else {
        return ProjectedPath {
            viewport,
            points: Vec::new(),
        };
    };

    let (min_lng, lng_range) = axis(rect.min().x, rect.max().x);
    let (min_lat, lat_range) = axis(rect.min().y, rect.max().y);

    let inner_width = (viewport.width - viewport.padding * 2.0).max(0.0);
    let inner_height = (viewport.height - viewport.padding * 2.0).max(0.0);
    let scale = (inner_width / lng_range).min(inner_height / lat_range);

    let offset_x = (viewport.width - lng_range * scale) / 2.0;
    let offset_y = (viewport.height - lat_range * scale) / 2.0;

    let points = coords
        .iter()
        .map(|c| Point {
            x: (c.lng - min_lng) * scale + offset_x,
            y: viewport.height - ((c.lat - min_lat) * scale + offset_y),
        })
        .collect();

    ProjectedPath { viewport, points }
}

/// Axis origin and range, widening a degenerate axis symmetrically so the
/// route stays centered on it.
fn axis(min: f64, max: f64) -> (f64, f64) {
    let range = max - min;
    if range > 0.0 {
        (min, range)
    } else {
        (min - MIN_RANGE_DEGREES / 2.0, MIN_RANGE_DEGREES)
    }
}
