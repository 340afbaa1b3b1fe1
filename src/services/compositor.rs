// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Card image compositing.
//!
//! Produces the downloadable card from two captures:
//! 1. the styled panel, rasterized at the supersampling scale
//! 2. optionally, the route map that sits over part of the panel
//!
//! The panel is drawn through a rounded-rectangle clip on a canvas with a
//! small transparent margin (so the anti-aliased corner edge is not cut
//! off), the map goes on top with the overlay blend mode at reduced
//! opacity, and the margin is trimmed before PNG encoding. Any failure
//! aborts the export; no partial image is ever returned.

use image::{ImageEncoder, Rgba, RgbaImage};
use resvg::tiny_skia::{
    FillRule, FilterQuality, IntRect, IntSize, Mask, Path, PathBuilder, Pixmap, PixmapPaint, Rect,
    Transform,
};
use resvg::tiny_skia::BlendMode;
use serde::Deserialize;

use crate::services::map_render::MapRenderError;

/// Supersampling multiplier for print-quality export.
pub const DEFAULT_SCALE: f32 = 3.0;
/// Panel corner radius in CSS px (2.5rem).
pub const DEFAULT_CORNER_RADIUS: f32 = 40.0;
pub const DEFAULT_MAP_OPACITY: f32 = 0.4;
/// Transparent margin around the clip while drawing, in output px.
pub const EDGE_PADDING: u32 = 10;
const MAX_OUTPUT_SIDE: u32 = 8192;
/// Bezier handle length for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Rectangle in CSS px, relative to the panel's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PanelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Layout of the export, in CSS px except for `scale`.
#[derive(Debug, Clone, Copy)]
pub struct CardLayout {
    pub panel_width: f32,
    pub panel_height: f32,
    pub scale: f32,
    pub corner_radius: f32,
    pub map_opacity: f32,
}

impl CardLayout {
    pub fn new(panel_width: f32, panel_height: f32) -> Self {
        Self {
            panel_width,
            panel_height,
            scale: DEFAULT_SCALE,
            corner_radius: DEFAULT_CORNER_RADIUS,
            map_opacity: DEFAULT_MAP_OPACITY,
        }
    }

    /// Output size in pixels.
    pub fn output_size(&self) -> Result<(u32, u32), ExportError> {
        let w = (self.panel_width * self.scale).round();
        let h = (self.panel_height * self.scale).round();
        if !w.is_finite() || !h.is_finite() || w < 1.0 || h < 1.0 {
            return Err(ExportError::InvalidGeometry(format!(
                "panel {}x{} at scale {}",
                self.panel_width, self.panel_height, self.scale
            )));
        }
        if w > MAX_OUTPUT_SIDE as f32 || h > MAX_OUTPUT_SIDE as f32 {
            return Err(ExportError::InvalidGeometry(format!(
                "output {}x{} exceeds {}",
                w, h, MAX_OUTPUT_SIDE
            )));
        }
        Ok((w as u32, h as u32))
    }
}

/// Map raster plus where its container sits on the panel.
#[derive(Debug, Clone, Copy)]
pub struct MapOverlay<'a> {
    pub image: &'a RgbaImage,
    pub container: PanelRect,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to decode capture: {0}")]
    Decode(String),

    #[error("invalid card geometry: {0}")]
    InvalidGeometry(String),

    #[error("could not allocate a {0}x{1} canvas")]
    Canvas(u32, u32),

    #[error("failed to encode png: {0}")]
    Encode(String),

    #[error("map render failed: {0}")]
    MapRender(#[from] MapRenderError),
}

/// Composite the card. Returns the trimmed output at `layout.output_size()`.
pub fn composite(
    panel: &RgbaImage,
    map: Option<MapOverlay<'_>>,
    layout: &CardLayout,
) -> Result<RgbaImage, ExportError> {
    let (w, h) = layout.output_size()?;
    let pad = EDGE_PADDING;
    let (canvas_w, canvas_h) = (w + pad * 2, h + pad * 2);
    let padf = pad as f32;

    let mut canvas = Pixmap::new(canvas_w, canvas_h).ok_or(ExportError::Canvas(canvas_w, canvas_h))?;

    let radius = (layout.corner_radius * layout.scale)
        .max(0.0)
        .min(w as f32 / 2.0)
        .min(h as f32 / 2.0);
    let clip_path = rounded_rect(w as f32, h as f32, radius)?;
    let mut clip = Mask::new(canvas_w, canvas_h).ok_or(ExportError::Canvas(canvas_w, canvas_h))?;
    clip.fill_path(
        &clip_path,
        FillRule::Winding,
        true,
        Transform::from_translate(padf, padf),
    );

    let panel_pixmap = pixmap_from_image(panel)?;
    let panel_paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    canvas.draw_pixmap(
        0,
        0,
        panel_pixmap.as_ref(),
        &panel_paint,
        Transform::from_row(
            w as f32 / panel.width() as f32,
            0.0,
            0.0,
            h as f32 / panel.height() as f32,
            padf,
            padf,
        ),
        Some(&clip),
    );

    if let Some(overlay) = map {
        let c = overlay.container;
        let (x, y) = (c.x * layout.scale, c.y * layout.scale);
        let (mw, mh) = (c.width * layout.scale, c.height * layout.scale);
        if !(mw > 0.0 && mh > 0.0 && x.is_finite() && y.is_finite()) {
            return Err(ExportError::InvalidGeometry(format!(
                "map container {:?}",
                c
            )));
        }

        let map_pixmap = pixmap_from_image(overlay.image)?;
        let map_paint = PixmapPaint {
            opacity: layout.map_opacity.clamp(0.0, 1.0),
            blend_mode: BlendMode::Overlay,
            quality: FilterQuality::Bicubic,
        };
        canvas.draw_pixmap(
            0,
            0,
            map_pixmap.as_ref(),
            &map_paint,
            Transform::from_row(
                mw / overlay.image.width() as f32,
                0.0,
                0.0,
                mh / overlay.image.height() as f32,
                padf + x,
                padf + y,
            ),
            Some(&clip),
        );
    }

    let trim = IntRect::from_xywh(pad as i32, pad as i32, w, h)
        .ok_or_else(|| ExportError::InvalidGeometry("trim rect".to_string()))?;
    let trimmed = canvas
        .clone_rect(trim)
        .ok_or_else(|| ExportError::InvalidGeometry("trim rect outside canvas".to_string()))?;

    Ok(image_from_pixmap(&trimmed))
}

/// Closed rounded rectangle at the origin.
fn rounded_rect(w: f32, h: f32, r: f32) -> Result<Path, ExportError> {
    if r <= 0.0 {
        let rect = Rect::from_xywh(0.0, 0.0, w, h)
            .ok_or_else(|| ExportError::InvalidGeometry(format!("rect {}x{}", w, h)))?;
        return Ok(PathBuilder::from_rect(rect));
    }

    let k = r * KAPPA;
    let mut pb = PathBuilder::new();
    pb.move_to(r, 0.0);
    pb.line_to(w - r, 0.0);
    pb.cubic_to(w - r + k, 0.0, w, r - k, w, r);
    pb.line_to(w, h - r);
    pb.cubic_to(w, h - r + k, w - r + k, h, w - r, h);
    pb.line_to(r, h);
    pb.cubic_to(r - k, h, 0.0, h - r + k, 0.0, h - r);
    pb.line_to(0.0, r);
    pb.cubic_to(0.0, r - k, r - k, 0.0, r, 0.0);
    pb.close();
    pb.finish()
        .ok_or_else(|| ExportError::InvalidGeometry(format!("rounded rect {}x{} r={}", w, h, r)))
}

/// Decode a PNG capture.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, ExportError> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| ExportError::Decode(e.to_string()))?;
    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(ExportError::Decode("empty image".to_string()));
    }
    Ok(rgba)
}

/// Lossless PNG encoding.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Straight RGBA → premultiplied pixmap.
pub(crate) fn pixmap_from_image(image: &RgbaImage) -> Result<Pixmap, ExportError> {
    let (w, h) = image.dimensions();
    let size = IntSize::from_wh(w, h).ok_or_else(|| ExportError::Decode("empty image".to_string()))?;
    let mut data = image.as_raw().clone();
    premultiply_rgba8_in_place(&mut data);
    Pixmap::from_vec(data, size).ok_or(ExportError::Canvas(w, h))
}

/// Premultiplied pixmap → straight RGBA.
pub(crate) fn image_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}
