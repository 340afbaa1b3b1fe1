// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Card export (session cookie required).
//!
//! The browser posts its panel capture and either its map capture or the
//! encoded route; the server composites the final PNG and returns it as a
//! download. Nothing is stored.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{AspectRatio, CardConfig};
use crate::services::compositor::{
    self, CardLayout, ExportError, MapOverlay, PanelRect, DEFAULT_CORNER_RADIUS,
    DEFAULT_MAP_OPACITY, DEFAULT_SCALE,
};
use crate::services::map_render::{MapRequest, MapStyle, RouteStyle};
use crate::services::polyline;
use crate::AppState;

/// Captures are large at 3× scale.
const MAX_EXPORT_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/cards/export", post(export_card))
        .layer(DefaultBodyLimit::max(MAX_EXPORT_BODY_BYTES))
}

fn default_scale() -> f32 {
    DEFAULT_SCALE
}

fn default_corner_radius() -> f32 {
    DEFAULT_CORNER_RADIUS
}

fn default_map_opacity() -> f32 {
    DEFAULT_MAP_OPACITY
}

/// Export request. Sizes are CSS px.
#[derive(Debug, Deserialize, Validate)]
pub struct ExportRequest {
    /// Base64 PNG of the styled panel (a `data:` URL prefix is accepted).
    #[validate(length(min = 1))]
    pub panel_png: String,
    /// Base64 PNG of the rendered map.
    #[serde(default)]
    pub map_png: Option<String>,
    /// Encoded route, rendered here when no map capture is sent.
    #[serde(default)]
    pub route_polyline: Option<String>,
    #[serde(default)]
    pub route_color: Option<String>,
    #[validate(range(min = 1.0, max = 2048.0))]
    pub panel_width: f32,
    #[validate(range(min = 1.0, max = 2048.0))]
    pub panel_height: f32,
    /// Map container, relative to the panel's top-left corner.
    #[serde(default)]
    pub map_container: Option<PanelRect>,
    #[serde(default = "default_scale")]
    #[validate(range(min = 1.0, max = 4.0))]
    pub scale: f32,
    #[serde(default = "default_corner_radius")]
    #[validate(range(min = 0.0, max = 512.0))]
    pub corner_radius: f32,
    #[serde(default = "default_map_opacity")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub map_opacity: f32,
    /// Icon, theme and label chosen for this card.
    #[serde(flatten)]
    #[validate(nested)]
    pub card: CardConfig,
    #[serde(default)]
    pub aspect: AspectRatio,
}

impl ExportRequest {
    fn layout(&self) -> CardLayout {
        CardLayout {
            panel_width: self.panel_width,
            panel_height: self.panel_height,
            scale: self.scale,
            corner_radius: self.corner_radius,
            map_opacity: self.map_opacity,
        }
    }

    fn wants_map(&self) -> bool {
        self.map_png.is_some() || self.route_polyline.is_some()
    }
}

/// Composite and return the card PNG as an attachment.
async fn export_card(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if req.wants_map() && req.map_container.is_none() {
        return Err(AppError::BadRequest(
            "map_container is required with a map".to_string(),
        ));
    }

    let panel_bytes = decode_base64(&req.panel_png, "panel_png")?;
    let map_bytes = req
        .map_png
        .as_deref()
        .map(|m| decode_base64(m, "map_png"))
        .transpose()?;

    let layout = req.layout();
    let (out_w, out_h) = layout.output_size()?;

    // No captured map: render the route here, sized to the container.
    let rendered_map = match (&map_bytes, req.route_polyline.as_deref(), req.map_container) {
        (None, Some(encoded), Some(container)) => {
            let coords = polyline::decode(encoded);
            if coords.is_empty() {
                tracing::debug!("Route decoded to nothing, exporting without map layer");
                None
            } else {
                let route = RouteStyle::new(req.route_color.as_deref(), None)
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let request = MapRequest {
                    coords,
                    style: MapStyle::default(),
                    route,
                    width: (container.width * layout.scale).round().max(1.0) as u32,
                    height: (container.height * layout.scale).round().max(1.0) as u32,
                };
                let map = state
                    .map_renderer
                    .render(request)
                    .await
                    .map_err(ExportError::from)?;
                Some(map.image)
            }
        }
        _ => None,
    };

    let container = req.map_container;
    let png = tokio::task::spawn_blocking(move || -> std::result::Result<Vec<u8>, ExportError> {
        let panel = compositor::decode_png(&panel_bytes)?;
        let captured = map_bytes.as_deref().map(compositor::decode_png).transpose()?;
        let map_image = captured.as_ref().or(rendered_map.as_ref());

        let overlay = match (map_image, container) {
            (Some(image), Some(container)) => Some(MapOverlay { image, container }),
            _ => None,
        };
        let card = compositor::composite(&panel, overlay, &layout)?;
        compositor::encode_png(&card)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("export task failed: {}", e)))??;

    let filename = req.card.export_filename(req.aspect);
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("bad export filename: {}", e)))?;
    tracing::info!(
        width = out_w,
        height = out_h,
        bytes = png.len(),
        filename = %filename,
        icon = req.card.badge().name,
        theme = ?req.card.theme,
        "Card exported"
    );

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    ))
}

/// Standard base64, with or without a `data:image/png;base64,` prefix.
fn decode_base64(raw: &str, field: &str) -> Result<Vec<u8>> {
    let payload = match raw.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => raw,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::BadRequest(format!("{} is not valid base64: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> ExportRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = request(serde_json::json!({
            "panel_png": "AAAA",
            "panel_width": 360.0,
            "panel_height": 450.0
        }));

        assert_eq!(req.scale, 3.0);
        assert_eq!(req.corner_radius, 40.0);
        assert_eq!(req.map_opacity, 0.4);
        assert_eq!(req.aspect, AspectRatio::Portrait);
        assert_eq!(req.card.icon, "grade");
        assert!(req.validate().is_ok());
        assert!(!req.wants_map());
    }

    #[test]
    fn test_validation_limits() {
        let long_label = "x".repeat(61);
        let req = request(serde_json::json!({
            "panel_png": "AAAA",
            "panel_width": 360.0,
            "panel_height": 450.0,
            "scale": 8.0,
            "custom_label": long_label
        }));

        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("scale"));
        assert!(err.errors().contains_key("card"));
        assert_eq!(req.card.custom_label.len(), 61);
    }

    #[test]
    fn test_decode_base64_accepts_data_url() {
        assert_eq!(decode_base64("data:image/png;base64,aGk=", "f").unwrap(), b"hi");
        assert_eq!(decode_base64("aGk=", "f").unwrap(), b"hi");
        assert!(decode_base64("***", "f").is_err());
    }
}
