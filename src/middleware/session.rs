// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie middleware.
//!
//! The Strava access token itself is the session: it lives in an HttpOnly
//! cookie whose lifetime matches the token's. There is no server-side
//! session store and no refresh; when the cookie expires the user signs in
//! again.

use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;

/// HttpOnly cookie holding the bearer token.
pub const TOKEN_COOKIE: &str = "strava_token";
/// Script-readable cookie holding the athlete's display name.
pub const NAME_COOKIE: &str = "athlete_name";

/// Bearer token from the session cookie.
#[derive(Clone)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Token from the jar, ignoring an empty cookie.
pub fn session_token(jar: &CookieJar) -> Option<SessionToken> {
    jar.get(TOKEN_COOKIE)
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
        .map(|v| SessionToken(v.to_string()))
}

/// Middleware that requires a session cookie. Fails fast with 401 before
/// any upstream call is made.
pub async fn require_session(
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar).ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(token);
    Ok(next.run(request).await)
}
