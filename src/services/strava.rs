// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client.
//!
//! Handles:
//! - OAuth authorize URL and code exchange
//! - Activity listing and detail fetches with the session's access token
//! - Status classification (rate limit, rejected token, other failures)

use serde::Deserialize;

use crate::config::Config;
use crate::models::Activity;

/// Scopes requested on authorization.
pub const OAUTH_SCOPE: &str = "read,activity:read_all";

/// Errors from the Strava client. The HTTP layer collapses these into a
/// single opaque message per endpoint.
#[derive(Debug, thiserror::Error)]
pub enum StravaError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("access token rejected")]
    Unauthorized,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl StravaClient {
    /// Create a client pointed at the configured API and OAuth hosts.
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.strava_api_url.clone(),
            oauth_url: config.strava_oauth_url.clone(),
            client_id: config.strava_client_id.clone(),
            client_secret: config.strava_client_secret.clone(),
            redirect_uri: config.strava_redirect_uri.clone(),
        }
    }

    /// Authorization page URL carrying the signed `state`.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.oauth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(OAUTH_SCOPE),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, StravaError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        check_response_json(response).await
    }

    /// One page of the athlete's activities, newest first.
    pub async fn list_activities(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Activity>, StravaError> {
        let response = self
            .http
            .get(format!("{}/athlete/activities", self.api_url))
            .bearer_auth(access_token)
            .query(&[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await?;

        check_response_json(response).await
    }

    /// Get a detailed activity by ID (includes `best_efforts`).
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<Activity, StravaError> {
        let response = self
            .http
            .get(format!("{}/activities/{}", self.api_url, activity_id))
            .bearer_auth(access_token)
            .send()
            .await?;

        check_response_json(response).await
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, StravaError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        return Err(match status.as_u16() {
            429 => {
                tracing::warn!("Strava rate limit hit (429)");
                StravaError::RateLimited
            }
            401 => StravaError::Unauthorized,
            code => StravaError::Status { status: code, body },
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| StravaError::Decode(e.to_string()))
}

/// Token exchange response (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub athlete: TokenAthlete,
}

/// Athlete summary from the token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenAthlete {
    pub id: u64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

impl TokenAthlete {
    /// "First Last", trimmed when either part is missing.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url() {
        let client = StravaClient::new(&Config::default());
        let url = client.authorize_url("abc=");

        assert!(url.starts_with("https://www.strava.com/oauth/authorize?"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fcallback"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=read%2Cactivity%3Aread_all"));
        assert!(url.ends_with("state=abc%3D"));
    }

    #[test]
    fn test_token_response_parses() {
        let json = r#"{
            "token_type": "Bearer",
            "access_token": "a1",
            "refresh_token": "r1",
            "expires_at": 1700000000,
            "expires_in": 21600,
            "athlete": {"id": 42, "firstname": "Ada", "lastname": "Lovelace", "city": "London"}
        }"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "a1");
        assert_eq!(token.expires_at, 1_700_000_000);
        assert_eq!(token.athlete.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_display_name_missing_last() {
        let athlete = TokenAthlete {
            id: 1,
            firstname: "Ada".to_string(),
            lastname: String::new(),
        };
        assert_eq!(athlete.display_name(), "Ada");
    }
}
