// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Personal-best detection over the athlete's GPS runs.
//!
//! Every ranking uses `elapsed_time` so that a record is a wall-clock
//! record. Fastest 5K and 10K come from the `best_efforts` on activity
//! detail responses, which the list endpoint does not include, so only the
//! first [`DETAIL_LIMIT`] GPS runs are fetched individually.

use futures_util::{stream, StreamExt};

use crate::format::{format_date, format_distance, pace_per_km};
use crate::models::{Achievement, AchievementKind, Activity, ActivityType};
use crate::services::strava::{StravaClient, StravaError};

/// Detail requests per achievements call, to stay well inside Strava's
/// rate limit.
pub const DETAIL_LIMIT: usize = 50;
const DETAIL_CONCURRENCY: usize = 4;

/// Run or TrailRun with a recorded route.
pub fn is_gps_run(activity: &Activity) -> bool {
    matches!(
        activity.activity_type,
        ActivityType::Run | ActivityType::TrailRun
    ) && activity.has_route()
}

/// Fetch details for the first GPS runs and detect achievements.
///
/// A failed detail fetch is logged and that run is skipped; it never fails
/// the whole call.
pub async fn collect(
    strava: &StravaClient,
    access_token: &str,
    activities: &[Activity],
) -> Vec<Achievement> {
    let runs: Vec<Activity> = activities
        .iter()
        .filter(|a| is_gps_run(a))
        .cloned()
        .collect();

    let ids: Vec<u64> = runs.iter().take(DETAIL_LIMIT).map(|run| run.id).collect();

    let details: Vec<Activity> = stream::iter(ids)
        .map(|id| async move {
            match strava.get_activity(access_token, id).await {
                Ok(detail) => Some(detail),
                Err(e) => {
                    log_detail_failure(id, &e);
                    None
                }
            }
        })
        .buffered(DETAIL_CONCURRENCY)
        .filter_map(|detail| async move { detail })
        .collect()
        .await;

    tracing::debug!(
        runs = runs.len(),
        details = details.len(),
        "Fetched activity details for achievements"
    );

    detect(&runs, &details)
}

fn log_detail_failure(activity_id: u64, err: &StravaError) {
    tracing::warn!(activity_id, error = %err, "Skipping activity detail for achievements");
}

/// Detect achievements from GPS runs and the detail records fetched for
/// some of them. Output order: 5K, 10K, longest run, best pace; kinds with
/// no candidate are omitted.
pub fn detect(runs: &[Activity], details: &[Activity]) -> Vec<Achievement> {
    let mut achievements = Vec::with_capacity(4);

    for (kind, effort) in [
        (AchievementKind::Fastest5K, "5k"),
        (AchievementKind::Fastest10K, "10k"),
    ] {
        if let Some((detail, seconds)) = fastest_effort(details, effort) {
            let activity = runs
                .iter()
                .find(|r| r.id == detail.id)
                .unwrap_or(detail);
            achievements.push(achievement(kind, activity, format_clock(seconds)));
        }
    }

    if let Some(longest) = runs
        .iter()
        .filter(|r| r.distance.is_finite())
        .max_by(|a, b| a.distance.total_cmp(&b.distance))
    {
        let value = format!("{} km", format_distance(longest.distance));
        achievements.push(achievement(AchievementKind::LongestRun, longest, value));
    }

    if let Some((fastest, pace)) = runs
        .iter()
        .filter(|r| r.distance > 0.0)
        .map(|r| (r, r.elapsed_time as f64 / r.distance))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .and_then(|(r, _)| pace_per_km(r.distance, r.elapsed_time).map(|p| (r, p)))
    {
        let value = format!("{} /km", pace);
        achievements.push(achievement(AchievementKind::BestPace, fastest, value));
    }

    achievements
}

/// Lowest `elapsed_time` for the named effort. Ties keep the first seen.
fn fastest_effort<'a>(details: &'a [Activity], name: &str) -> Option<(&'a Activity, u64)> {
    details
        .iter()
        .filter_map(|d| d.best_effort(name).map(|e| (d, e.elapsed_time)))
        .fold(None, |best, (d, t)| match best {
            Some((_, bt)) if bt <= t => best,
            _ => Some((d, t)),
        })
}

fn achievement(kind: AchievementKind, activity: &Activity, value: String) -> Achievement {
    Achievement {
        kind,
        label: kind.label(),
        date: activity.start_local().map(format_date).unwrap_or_default(),
        activity: activity.clone(),
        value,
    }
}

/// Minutes and seconds without an hour field: 3725 → "62:05".
fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
