// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava proxy and activity views (session cookie required).

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use geojson::{Feature, Geometry, JsonObject, Value as GeoValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::SessionToken;
use crate::models::card::{ThemeColors, ICON_CATEGORIES};
use crate::models::{Achievement, Activity, CardSummary, IconCategory, Theme};
use crate::services::browse::{BrowseResponse, BrowseState, YearFilter};
use crate::services::compositor::encode_png;
use crate::services::map_render::{
    MapRenderError, MapRequest, MapStyle, RouteStyle, END_MARKER_COLOR, FIT_PADDING, GLOW_BLUR,
    GLOW_OPACITY, GLOW_WIDTH_FACTOR, START_MARKER_COLOR,
};
use crate::services::strava::StravaError;
use crate::services::{achievements, polyline, preview, projection};
use crate::AppState;

/// Upstream page size for the full activity list.
pub const LIST_PAGE_SIZE: u32 = 200;
/// Upstream page size for the paged feed.
pub const FEED_PAGE_SIZE: u32 = 20;
const DEFAULT_MAP_WIDTH: u32 = 800;
const DEFAULT_MAP_HEIGHT: u32 = 600;

const FETCH_ACTIVITIES: &str = "Failed to fetch activities";
const FETCH_ACTIVITY: &str = "Failed to fetch activity";
const FETCH_ACHIEVEMENTS: &str = "Failed to fetch achievements";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/strava/activities", get(list_runs))
        .route("/api/strava/feed", get(feed))
        .route("/api/strava/browse", get(browse))
        .route("/api/strava/achievements", get(get_achievements))
        .route("/api/strava/activities/{id}", get(get_activity))
        .route("/api/strava/activities/{id}/card", get(get_card))
        .route("/api/strava/activities/{id}/route", get(get_route))
        .route("/api/strava/activities/{id}/preview.svg", get(get_preview))
        .route("/api/strava/activities/{id}/map.png", get(get_map_png))
}

#[derive(Serialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<Activity>,
}

/// Fetch the athlete's recent activities, keeping running types only.
async fn fetch_runs(
    state: &AppState,
    token: &SessionToken,
    message: &'static str,
) -> Result<Vec<Activity>> {
    let activities = state
        .strava
        .list_activities(token.as_str(), 1, LIST_PAGE_SIZE)
        .await
        .map_err(AppError::upstream(message))?;

    let total = activities.len();
    let runs: Vec<Activity> = activities.into_iter().filter(Activity::is_running).collect();
    tracing::debug!(total, runs = runs.len(), "Fetched activities");
    Ok(runs)
}

/// Running activities (Run, TrailRun, VirtualRun) in upstream order.
async fn list_runs(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
) -> Result<Json<ActivitiesResponse>> {
    let activities = fetch_runs(&state, &token, FETCH_ACTIVITIES).await?;
    Ok(Json(ActivitiesResponse { activities }))
}

#[derive(Deserialize)]
pub struct FeedParams {
    #[serde(default, rename = "type")]
    activity_type: Option<String>,
    #[serde(default)]
    page: Option<String>,
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub activities: Vec<Activity>,
    pub page: u32,
    pub has_more: bool,
}

/// One upstream page of any activity type, optionally filtered by type.
async fn feed(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Query(params): Query<FeedParams>,
) -> Result<Json<FeedResponse>> {
    let page = parse_page(params.page.as_deref())?;
    let type_filter = params
        .activity_type
        .filter(|t| !t.is_empty() && t != "all");

    let activities = state
        .strava
        .list_activities(token.as_str(), page, FEED_PAGE_SIZE)
        .await
        .map_err(AppError::upstream(FETCH_ACTIVITIES))?;

    let has_more = activities.len() == FEED_PAGE_SIZE as usize;
    let activities: Vec<Activity> = match type_filter {
        Some(kind) => activities
            .into_iter()
            .filter(|a| a.activity_type.as_str() == kind)
            .collect(),
        None => activities,
    };

    Ok(Json(FeedResponse {
        activities,
        page,
        has_more,
    }))
}

#[derive(Deserialize)]
pub struct BrowseParams {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    page: Option<String>,
}

/// Activity browser over running activities.
async fn browse(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<BrowseResponse>> {
    let year = YearFilter::parse(params.year.as_deref())
        .ok_or_else(|| AppError::BadRequest("year must be \"all\" or a number".to_string()))?;
    let page = parse_page(params.page.as_deref())?;

    let mut browse = BrowseState::default();
    browse.set_query(params.q.as_deref().unwrap_or_default().trim());
    browse.set_year(year);
    browse.set_page(page as usize);

    let runs = fetch_runs(&state, &token, FETCH_ACTIVITIES).await?;
    Ok(Json(BrowseResponse::build(&browse, &runs)))
}

#[derive(Serialize)]
pub struct AchievementsResponse {
    pub achievements: Vec<Achievement>,
}

async fn get_achievements(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
) -> Result<Json<AchievementsResponse>> {
    let runs = fetch_runs(&state, &token, FETCH_ACHIEVEMENTS).await?;
    let achievements = achievements::collect(&state.strava, token.as_str(), &runs).await;

    tracing::info!(count = achievements.len(), "Achievements detected");
    Ok(Json(AchievementsResponse { achievements }))
}

/// Detail fetch; an upstream 404 is passed on as 404.
async fn fetch_activity(state: &AppState, token: &SessionToken, id: u64) -> Result<Activity> {
    match state.strava.get_activity(token.as_str(), id).await {
        Ok(activity) => Ok(activity),
        Err(StravaError::Status { status: 404, .. }) => {
            Err(AppError::NotFound(format!("activity {}", id)))
        }
        Err(e) => Err(AppError::upstream(FETCH_ACTIVITY)(e)),
    }
}

/// Raw activity detail.
async fn get_activity(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<u64>,
) -> Result<Json<Activity>> {
    Ok(Json(fetch_activity(&state, &token, id).await?))
}

#[derive(Serialize)]
pub struct CardResponse {
    pub summary: CardSummary,
    pub themes: Vec<ThemeColors>,
    pub icon_categories: &'static [IconCategory],
}

async fn get_card(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<u64>,
) -> Result<Json<CardResponse>> {
    let activity = fetch_activity(&state, &token, id).await?;

    Ok(Json(CardResponse {
        summary: CardSummary::from_activity(&activity),
        themes: Theme::ALL.iter().map(|t| t.colors()).collect(),
        icon_categories: ICON_CATEGORIES,
    }))
}

#[derive(Deserialize)]
pub struct RouteParams {
    #[serde(default)]
    style: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    width: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct GlowParams {
    pub width: f64,
    pub opacity: f64,
    pub blur: f64,
}

#[derive(Debug, Serialize)]
pub struct Marker {
    /// `[lng, lat]`
    pub position: [f64; 2],
    pub color: &'static str,
}

/// Inputs for a client-side map renderer.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub has_route: bool,
    pub style_url: String,
    pub route: RouteStyle,
    pub glow: GlowParams,
    pub fit_padding: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geojson: Option<Feature>,
    /// `[[west, south], [east, north]]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[[f64; 2]; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Marker>,
}

impl RouteResponse {
    pub fn build(coords: &[polyline::LatLng], style: &MapStyle, route: RouteStyle) -> Self {
        let glow = GlowParams {
            width: route.width * GLOW_WIDTH_FACTOR,
            opacity: GLOW_OPACITY,
            blur: GLOW_BLUR,
        };
        let mut response = Self {
            has_route: false,
            style_url: style.url().to_string(),
            route,
            glow,
            fit_padding: FIT_PADDING,
            geojson: None,
            bounds: None,
            start: None,
            end: None,
        };

        let (Some(rect), Some(first), Some(last)) =
            (projection::bounds(coords), coords.first(), coords.last())
        else {
            return response;
        };

        let line = coords.iter().map(|c| vec![c.lng, c.lat]).collect();
        let mut properties = JsonObject::new();
        properties.insert("points".to_string(), coords.len().into());

        response.has_route = true;
        response.geojson = Some(Feature {
            bbox: None,
            geometry: Some(Geometry::new(GeoValue::LineString(line))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
        response.bounds = Some([
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        ]);
        response.start = Some(Marker {
            position: [first.lng, first.lat],
            color: START_MARKER_COLOR,
        });
        response.end = Some(Marker {
            position: [last.lng, last.lat],
            color: END_MARKER_COLOR,
        });
        response
    }
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<u64>,
    Query(params): Query<RouteParams>,
) -> Result<Json<RouteResponse>> {
    let route = RouteStyle::new(params.color.as_deref(), params.width)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let style = params
        .style
        .as_deref()
        .map(MapStyle::from_key)
        .unwrap_or_default();

    let activity = fetch_activity(&state, &token, id).await?;
    let coords = activity.route().map(polyline::decode).unwrap_or_default();

    Ok(Json(RouteResponse::build(&coords, &style, route)))
}

async fn get_preview(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse> {
    let activity = fetch_activity(&state, &token, id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "private, max-age=300"),
        ],
        preview::thumbnail_svg(&activity),
    ))
}

#[derive(Deserialize)]
pub struct MapParams {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    line_width: Option<f64>,
}

/// Route raster from the configured map renderer.
async fn get_map_png(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<SessionToken>,
    Path(id): Path<u64>,
    Query(params): Query<MapParams>,
) -> Result<impl IntoResponse> {
    let route = RouteStyle::new(params.color.as_deref(), params.line_width)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let activity = fetch_activity(&state, &token, id).await?;
    let coords = activity.route().map(polyline::decode).unwrap_or_default();
    if coords.is_empty() {
        return Err(AppError::NotFound(format!("route for activity {}", id)));
    }

    let request = MapRequest {
        coords,
        style: MapStyle::default(),
        route,
        width: params.width.unwrap_or(DEFAULT_MAP_WIDTH),
        height: params.height.unwrap_or(DEFAULT_MAP_HEIGHT),
    };
    let rendered = state
        .map_renderer
        .render(request)
        .await
        .map_err(|e| match e {
            MapRenderError::InvalidSize(..) => AppError::BadRequest(e.to_string()),
            other => AppError::Export(other.into()),
        })?;
    let png = encode_png(&rendered.image)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// Pages are 1-based. Absent means page 1.
fn parse_page(raw: Option<&str>) -> Result<u32> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(1),
        Some(p) => p
            .parse::<u32>()
            .ok()
            .filter(|&n| n >= 1)
            .ok_or_else(|| AppError::BadRequest(format!("page must be a positive integer, got {:?}", p))),
    }
}
