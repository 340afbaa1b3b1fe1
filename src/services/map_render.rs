// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route map rendering.
//!
//! Basemap tiles come from an external style (Carto GL styles); this module
//! owns the inputs that style is driven with and a built-in rasterizer for
//! the route layers themselves:
//! - a wide, translucent, blurred "glow" stroke
//! - the full-opacity route stroke on top, same color
//! - start and end markers
//!
//! Rendering is exposed as a one-shot future that resolves only once the
//! raster is complete. Callers await it before compositing; there is no
//! polling and no fixed delay.

use futures_util::future::{BoxFuture, FutureExt};
use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};
use serde::Serialize;
use std::fmt::Write as _;
use tokio::sync::oneshot;

use crate::services::compositor::image_from_pixmap;
use crate::services::polyline::LatLng;
use crate::services::projection::{project, ProjectedPath, Viewport};

/// Strava orange.
pub const DEFAULT_ROUTE_COLOR: &str = "#FC4C02";
pub const DEFAULT_ROUTE_WIDTH: f64 = 4.0;
pub const START_MARKER_COLOR: &str = "#22c55e";
pub const END_MARKER_COLOR: &str = "#ef4444";
/// Padding used when fitting the map to the route bounds.
pub const FIT_PADDING: f64 = 40.0;
pub const GLOW_WIDTH_FACTOR: f64 = 3.0;
pub const GLOW_OPACITY: f64 = 0.3;
pub const GLOW_BLUR: f64 = 4.0;
const MARKER_RADIUS: f64 = 7.0;
const MAX_DIMENSION: u32 = 4096;

/// Basemap style. Known keys map to free Carto GL styles; anything else is
/// treated as a style URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MapStyle {
    #[default]
    CartoDark,
    CartoVoyager,
    CartoPositron,
    Custom(String),
}

impl MapStyle {
    pub fn from_key(key: &str) -> Self {
        match key {
            "cartoDark" => MapStyle::CartoDark,
            "cartoVoyager" => MapStyle::CartoVoyager,
            "cartoPositron" => MapStyle::CartoPositron,
            other => MapStyle::Custom(other.to_string()),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            MapStyle::CartoDark => "https://basemaps.cartocdn.com/gl/dark-matter-gl-style/style.json",
            MapStyle::CartoVoyager => "https://basemaps.cartocdn.com/gl/voyager-gl-style/style.json",
            MapStyle::CartoPositron => {
                "https://basemaps.cartocdn.com/gl/positron-gl-style/style.json"
            }
            MapStyle::Custom(url) => url,
        }
    }
}

/// Route stroke color and width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStyle {
    pub color: String,
    pub width: f64,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_ROUTE_COLOR.to_string(),
            width: DEFAULT_ROUTE_WIDTH,
        }
    }
}

impl RouteStyle {
    /// Validated style. Colors must be `#rgb`, `#rrggbb` or `#rrggbbaa`
    /// since they end up inside generated SVG.
    pub fn new(color: Option<&str>, width: Option<f64>) -> Result<Self, MapRenderError> {
        let color = color.unwrap_or(DEFAULT_ROUTE_COLOR);
        if !is_hex_color(color) {
            return Err(MapRenderError::InvalidStyle(format!(
                "unsupported color {:?}",
                color
            )));
        }
        let width = width.unwrap_or(DEFAULT_ROUTE_WIDTH);
        if !(0.5..=32.0).contains(&width) {
            return Err(MapRenderError::InvalidStyle(format!(
                "route width {} out of range",
                width
            )));
        }
        Ok(Self {
            color: color.to_string(),
            width,
        })
    }
}

pub(crate) fn is_hex_color(raw: &str) -> bool {
    raw.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Everything a renderer needs to draw one route.
#[derive(Debug, Clone)]
pub struct MapRequest {
    pub coords: Vec<LatLng>,
    pub style: MapStyle,
    pub route: RouteStyle,
    /// Output size in pixels
    pub width: u32,
    pub height: u32,
}

/// Completed route raster (straight RGBA).
#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub image: RgbaImage,
}

#[derive(Debug, thiserror::Error)]
pub enum MapRenderError {
    #[error("route has no coordinates")]
    EmptyRoute,

    #[error("invalid map size {0}x{1}")]
    InvalidSize(u32, u32),

    #[error("invalid route style: {0}")]
    InvalidStyle(String),

    #[error("failed to build route layers: {0}")]
    Svg(String),

    #[error("render was abandoned before completion")]
    Abandoned,
}

/// A component that turns a route into pixels.
///
/// The returned future resolves once rendering has fully completed.
pub trait MapRenderer: Send + Sync {
    fn render(&self, request: MapRequest) -> BoxFuture<'static, Result<RenderedMap, MapRenderError>>;
}

/// Built-in renderer: route layers on a transparent background, rasterized
/// on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteRasterizer;

impl MapRenderer for RouteRasterizer {
    fn render(&self, request: MapRequest) -> BoxFuture<'static, Result<RenderedMap, MapRenderError>> {
        let (tx, rx) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            // The waiting future was dropped (client went away); skip the work.
            if tx.is_closed() {
                tracing::debug!("Map render abandoned before start");
                return;
            }
            let result = rasterize(&request);
            if tx.send(result).is_err() {
                tracing::debug!("Map render completed after caller went away");
            }
        });

        async move { rx.await.map_err(|_| MapRenderError::Abandoned)? }.boxed()
    }
}

fn rasterize(request: &MapRequest) -> Result<RenderedMap, MapRenderError> {
    let (width, height) = (request.width, request.height);
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(MapRenderError::InvalidSize(width, height));
    }
    if request.coords.is_empty() {
        return Err(MapRenderError::EmptyRoute);
    }

    let viewport = Viewport::new(f64::from(width), f64::from(height), FIT_PADDING);
    let path = project(&request.coords, viewport);
    let svg = route_layers_svg(&path, &request.route);

    let tree = usvg::Tree::from_str(&svg, &usvg::Options::default())
        .map_err(|e| MapRenderError::Svg(e.to_string()))?;
    let mut pixmap = Pixmap::new(width, height).ok_or(MapRenderError::InvalidSize(width, height))?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    tracing::debug!(
        points = request.coords.len(),
        width,
        height,
        style = request.style.url(),
        "Route layers rendered"
    );

    Ok(RenderedMap {
        image: image_from_pixmap(&pixmap),
    })
}

/// SVG document with the glow, route and marker layers for `path`.
pub fn route_layers_svg(path: &ProjectedPath, route: &RouteStyle) -> String {
    let Viewport { width, height, .. } = path.viewport;
    let d = path.to_svg_path();
    let mut svg = String::with_capacity(d.len() * 2 + 1024);

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );
    let _ = write!(
        svg,
        r#"<defs><filter id="glow" filterUnits="userSpaceOnUse" x="0" y="0" width="{w}" height="{h}"><feGaussianBlur stdDeviation="{blur}"/></filter></defs>"#,
        w = width,
        h = height,
        blur = GLOW_BLUR
    );

    if path.points.len() > 1 {
        let _ = write!(
            svg,
            r#"<path d="{d}" fill="none" stroke="{c}" stroke-width="{sw}" stroke-opacity="{o}" stroke-linecap="round" stroke-linejoin="round" filter="url(#glow)"/>"#,
            d = d,
            c = route.color,
            sw = route.width * GLOW_WIDTH_FACTOR,
            o = GLOW_OPACITY
        );
        let _ = write!(
            svg,
            r#"<path d="{d}" fill="none" stroke="{c}" stroke-width="{sw}" stroke-linecap="round" stroke-linejoin="round"/>"#,
            d = d,
            c = route.color,
            sw = route.width
        );
    }

    if let (Some(start), Some(end)) = (path.start(), path.end()) {
        for (p, color) in [(start, START_MARKER_COLOR), (end, END_MARKER_COLOR)] {
            let _ = write!(
                svg,
                r##"<circle cx="{x:.1}" cy="{y:.1}" r="{r}" fill="{color}" stroke="#ffffff" stroke-width="2"/>"##,
                x = p.x,
                y = p.y,
                r = MARKER_RADIUS,
                color = color
            );
        }
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_route() -> Vec<LatLng> {
        crate::services::polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@")
    }

    #[test]
    fn test_style_keys() {
        assert!(MapStyle::from_key("cartoDark").url().contains("dark-matter"));
        assert!(MapStyle::from_key("cartoPositron").url().contains("positron"));
        assert_eq!(
            MapStyle::from_key("https://tiles.example/style.json").url(),
            "https://tiles.example/style.json"
        );
        assert_eq!(MapStyle::default(), MapStyle::CartoDark);
    }

    #[test]
    fn test_route_style_validation() {
        assert_eq!(RouteStyle::new(None, None).unwrap(), RouteStyle::default());
        assert!(RouteStyle::new(Some("#0af"), Some(2.0)).is_ok());
        assert!(RouteStyle::new(Some("red\"/><script"), None).is_err());
        assert!(RouteStyle::new(Some("#12345"), None).is_err());
        assert!(RouteStyle::new(None, Some(0.0)).is_err());
    }

    #[test]
    fn test_layers_svg_structure() {
        let path = project(&sample_route(), Viewport::new(400.0, 300.0, FIT_PADDING));
        let svg = route_layers_svg(&path, &RouteStyle::default());

        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains(r#"stroke-width="12""#));
        assert!(svg.contains(r#"stroke-opacity="0.3""#));
        assert!(svg.contains(START_MARKER_COLOR));
        assert!(svg.contains(END_MARKER_COLOR));
    }

    #[tokio::test]
    async fn test_rasterizer_draws_route() {
        let request = MapRequest {
            coords: sample_route(),
            style: MapStyle::default(),
            route: RouteStyle::default(),
            width: 240,
            height: 180,
        };
        let rendered = RouteRasterizer.render(request).await.unwrap();

        assert_eq!(rendered.image.dimensions(), (240, 180));
        let opaque = rendered.image.pixels().filter(|p| p.0[3] > 0).count();
        assert!(opaque > 0, "route should cover some pixels");
        // Corners stay transparent: no basemap is drawn here.
        assert_eq!(rendered.image.get_pixel(0, 0).0[3], 0);
    }

    #[tokio::test]
    async fn test_rasterizer_rejects_bad_input() {
        let empty = MapRequest {
            coords: Vec::new(),
            style: MapStyle::default(),
            route: RouteStyle::default(),
            width: 100,
            height: 100,
        };
        assert!(matches!(
            RouteRasterizer.render(empty).await,
            Err(MapRenderError::EmptyRoute)
        ));

        let zero = MapRequest {
            coords: sample_route(),
            style: MapStyle::default(),
            route: RouteStyle::default(),
            width: 0,
            height: 100,
        };
        assert!(matches!(
            RouteRasterizer.render(zero).await,
            Err(MapRenderError::InvalidSize(0, 100))
        ));
    }
}
