// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers: a local stand-in for the Strava API and a test app
//! wired to it.

use axum::{
    body::Body,
    extract::{Form, Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use runstat::config::Config;
use runstat::routes::create_router;
use runstat::services::RouteRasterizer;
use runstat::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Access token the fake upstream accepts.
#[allow(dead_code)]
pub const TEST_TOKEN: &str = "test-access-token";
/// Authorization code the fake upstream accepts.
#[allow(dead_code)]
pub const GOOD_CODE: &str = "good-code";

/// Canned upstream behavior.
#[derive(Default, Clone)]
pub struct FakeStrava {
    pub activities: Vec<Value>,
    pub details: HashMap<u64, Value>,
    pub fail_list: bool,
}

#[allow(dead_code)]
impl FakeStrava {
    pub fn with_activities(activities: Vec<Value>) -> Self {
        Self {
            activities,
            ..Self::default()
        }
    }
}

/// Minimal activity payload with an extra upstream field for pass-through
/// checks.
#[allow(dead_code)]
pub fn activity(id: u64, kind: &str, name: &str, polyline: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "distance": 5000.0 + id as f64,
        "moving_time": 1200,
        "elapsed_time": 1260,
        "total_elevation_gain": 10.0,
        "type": kind,
        "sport_type": kind,
        "start_date": "2024-05-01T14:00:00Z",
        "start_date_local": "2024-05-01T07:00:00Z",
        "average_speed": 4.1,
        "max_speed": 5.0,
        "kudos_count": id,
        "map": { "id": format!("a{}", id), "summary_polyline": polyline }
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h == format!("Bearer {}", TEST_TOKEN))
}

async fn list_activities(
    State(fake): State<Arc<FakeStrava>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if fake.fail_list {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(30);
    let items: Vec<Value> = fake
        .activities
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    Json(items).into_response()
}

async fn get_activity(
    State(fake): State<Arc<FakeStrava>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match fake.details.get(&id) {
        Some(detail) => Json(detail.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Record Not Found"}))).into_response(),
    }
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    if form.get("code").map(String::as_str) != Some(GOOD_CODE)
        || form.get("grant_type").map(String::as_str) != Some("authorization_code")
    {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "Bad Request"}))).into_response();
    }

    let expires_at = chrono::Utc::now().timestamp() + 6 * 3600;
    Json(json!({
        "token_type": "Bearer",
        "access_token": TEST_TOKEN,
        "refresh_token": "refresh",
        "expires_at": expires_at,
        "athlete": { "id": 42, "firstname": "Ada", "lastname": "Lovelace" }
    }))
    .into_response()
}

/// Start the fake upstream on an ephemeral port; returns its base URL.
pub async fn spawn_fake_strava(fake: FakeStrava) -> String {
    let app = Router::new()
        .route("/api/v3/athlete/activities", get(list_activities))
        .route("/api/v3/activities/{id}", get(get_activity))
        .route("/oauth/token", post(token))
        .with_state(Arc::new(fake));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake upstream");
    });

    format!("http://{}", addr)
}

/// Test app pointed at a fresh fake upstream.
#[allow(dead_code)]
pub async fn create_test_app(fake: FakeStrava) -> (Router, Arc<AppState>) {
    let base = spawn_fake_strava(fake).await;
    let config = Config {
        strava_api_url: format!("{}/api/v3", base),
        strava_oauth_url: format!("{}/oauth", base),
        ..Config::default()
    };

    let state = Arc::new(AppState::new(config, Arc::new(RouteRasterizer)));
    (create_router(state.clone()), state)
}

/// GET with the session cookie set.
#[allow(dead_code)]
pub fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("strava_token={}", TEST_TOKEN))
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
