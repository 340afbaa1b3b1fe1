// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Callback URL registered with Strava (points at `/auth/callback`)
    pub strava_redirect_uri: String,
    /// Base URL of the browser-facing pages, used for post-auth redirects
    pub frontend_url: String,
    /// Strava REST API base URL
    pub strava_api_url: String,
    /// Strava OAuth base URL (`/authorize`, `/token`)
    pub strava_oauth_url: String,
    /// Mark session cookies `Secure`
    pub cookie_secure: bool,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// HMAC key for signing the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_redirect_uri: "http://localhost:8080/auth/callback".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            strava_api_url: "https://www.strava.com/api/v3".to_string(),
            strava_oauth_url: "https://www.strava.com/oauth".to_string(),
            cookie_secure: false,
            port: 8080,
            strava_client_secret: "test_secret".to_string(),
            oauth_state_key: b"test_oauth_state_key_32_bytes!!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let frontend_url = env::var("FRONTEND_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let cookie_secure = match env::var("COOKIE_SECURE") {
            Ok(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid("COOKIE_SECURE"))?,
            Err(_) => !frontend_url.starts_with("http://"),
        };

        Ok(Self {
            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            strava_redirect_uri: env::var("STRAVA_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8080/auth/callback".to_string()),
            frontend_url,
            strava_api_url: env::var("STRAVA_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://www.strava.com/api/v3".to_string()),
            strava_oauth_url: env::var("STRAVA_OAUTH_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://www.strava.com/oauth".to_string()),
            cookie_secure,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,

            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
