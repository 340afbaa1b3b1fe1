// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::compositor::ExportError;
use crate::services::strava::StravaError;

/// Application error type that converts to HTTP responses.
///
/// Only a coarse message crosses the HTTP boundary. Anything more specific
/// is logged where the error is converted.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upstream Strava failure, carrying the user-facing message.
    #[error("{0}")]
    Upstream(&'static str),

    #[error("Failed to export card: {0}")]
    Export(#[from] ExportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Build a converter that logs a Strava error and collapses it into an
    /// opaque upstream failure.
    ///
    /// ```ignore
    /// strava.list_activities(token, 200).await.map_err(AppError::upstream("Failed to fetch activities"))?;
    /// ```
    pub fn upstream(message: &'static str) -> impl FnOnce(StravaError) -> AppError {
        move |err| {
            tracing::error!(error = %err, "{}", message);
            AppError::Upstream(message)
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authenticated", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Invalid request", Some(msg.clone()))
            }
            AppError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, *msg, None),
            AppError::Export(err) => {
                tracing::error!(error = %err, "Card export failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to export card",
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
