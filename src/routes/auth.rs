// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava OAuth authentication routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::session::{session_token, NAME_COOKIE, TOKEN_COOKIE};
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a signed `state` stays acceptable.
const STATE_MAX_AGE_MS: u128 = 15 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/strava", get(auth_start))
        .route("/auth/callback", get(auth_callback))
        .route("/auth/logout", get(logout))
        .route("/api/session", get(session))
}

/// Start OAuth flow - redirect to Strava authorization.
async fn auth_start(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let timestamp = now_millis()?;
    let oauth_state = sign_state(timestamp, &state.config.oauth_state_key)?;
    let auth_url = state.strava.authorize_url(&oauth_state);

    tracing::info!(
        client_id = %state.config.strava_client_id,
        "Starting OAuth flow, redirecting to Strava"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

/// OAuth callback - exchange the code and store the token in cookies.
///
/// Every outcome is a redirect; failures land on the landing page with an
/// `error` flag.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    let config = &state.config;

    if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return (jar, landing_with_error(config, error));
    }

    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        tracing::warn!("OAuth callback without a code");
        return (jar, landing_with_error(config, "no_code"));
    };

    if let Some(oauth_state) = params.state.as_deref() {
        let fresh = now_millis()
            .ok()
            .is_some_and(|now| verify_state(oauth_state, &config.oauth_state_key, now));
        if !fresh {
            tracing::warn!("Invalid or expired OAuth state parameter");
            return (jar, landing_with_error(config, "invalid_state"));
        }
    }

    tracing::info!("Exchanging authorization code for tokens");

    let token = match state.strava.exchange_code(code).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "Strava token exchange failed");
            return (jar, landing_with_error(config, "oauth_failed"));
        }
    };

    let max_age = cookie_max_age(token.expires_at, unix_now());
    let name = token.athlete.display_name();

    tracing::info!(
        athlete_id = token.athlete.id,
        max_age_secs = max_age.whole_seconds(),
        "OAuth successful, session cookies set"
    );

    let jar = jar
        .add(session_cookie(config, TOKEN_COOKIE, token.access_token, max_age, true))
        .add(session_cookie(
            config,
            NAME_COOKIE,
            urlencoding::encode(&name).into_owned(),
            max_age,
            false,
        ));

    let redirect = format!("{}/customize", config.frontend_url);
    (jar, Redirect::temporary(&redirect))
}

/// Logout - drop both session cookies.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar
        .remove(Cookie::build(TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(NAME_COOKIE).path("/"));

    tracing::info!("Session cookies cleared");
    (jar, Redirect::temporary(&format!("{}/", state.config.frontend_url)))
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub athlete_name: Option<String>,
}

/// Session status for the frontend. Never echoes the token.
async fn session(jar: CookieJar) -> Json<SessionResponse> {
    let authenticated = session_token(&jar).is_some();
    let athlete_name = jar
        .get(NAME_COOKIE)
        .filter(|_| authenticated)
        .map(|c| {
            urlencoding::decode(c.value())
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| c.value().to_string())
        });

    Json(SessionResponse {
        authenticated,
        athlete_name,
    })
}

fn landing_with_error(config: &Config, error: &str) -> Redirect {
    Redirect::temporary(&format!(
        "{}/?error={}",
        config.frontend_url,
        urlencoding::encode(error)
    ))
}

fn session_cookie(
    config: &Config,
    name: &'static str,
    value: String,
    max_age: time::Duration,
    http_only: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(http_only)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(max_age)
        .build()
}

/// Cookie lifetime matching the token's remaining lifetime, never negative.
fn cookie_max_age(expires_at: i64, now: i64) -> time::Duration {
    time::Duration::seconds(expires_at.saturating_sub(now).max(0))
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Signed state: URL-safe base64 of `"timestamp_hex|signature_hex"`.
fn sign_state(timestamp_ms: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{:x}", timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Check the signature and that the state is no older than
/// [`STATE_MAX_AGE_MS`].
fn verify_state(state: &str, secret: &[u8], now_ms: u128) -> bool {
    let Some(state_str) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    let Some((timestamp_hex, signature_hex)) = state_str.split_once('|') else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(timestamp_hex.as_bytes());
    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected_signature.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    match u128::from_str_radix(timestamp_hex, 16) {
        Ok(issued) => now_ms.saturating_sub(issued) <= STATE_MAX_AGE_MS,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"secret_key";
    const ISSUED: u128 = 1_700_000_000_000;

    #[test]
    fn test_state_round_trip() {
        let state = sign_state(ISSUED, SECRET).unwrap();
        assert!(verify_state(&state, SECRET, ISSUED + 1_000));
    }

    #[test]
    fn test_state_wrong_secret() {
        let state = sign_state(ISSUED, SECRET).unwrap();
        assert!(!verify_state(&state, b"wrong_key", ISSUED));
    }

    #[test]
    fn test_state_expired() {
        let state = sign_state(ISSUED, SECRET).unwrap();
        assert!(!verify_state(&state, SECRET, ISSUED + STATE_MAX_AGE_MS + 1));
    }

    #[test]
    fn test_state_tampered_timestamp() {
        let state = sign_state(ISSUED, SECRET).unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&state).unwrap()).unwrap();
        let (_, signature) = decoded.split_once('|').unwrap();
        let forged = URL_SAFE_NO_PAD.encode(format!("{:x}|{}", ISSUED + 60_000, signature));

        assert!(!verify_state(&forged, SECRET, ISSUED + 60_000));
    }

    #[test]
    fn test_state_malformed() {
        assert!(!verify_state("not base64 !!", SECRET, ISSUED));
        assert!(!verify_state(&URL_SAFE_NO_PAD.encode("no-separator"), SECRET, ISSUED));
    }

    #[test]
    fn test_cookie_max_age_never_negative() {
        assert_eq!(cookie_max_age(1_000, 400).whole_seconds(), 600);
        assert_eq!(cookie_max_age(400, 1_000).whole_seconds(), 0);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = Config {
            cookie_secure: true,
            ..Config::default()
        };
        let cookie = session_cookie(
            &config,
            TOKEN_COOKIE,
            "tok".to_string(),
            time::Duration::seconds(3600),
            true,
        );

        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }
}
