// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity model as returned by the list and detail endpoints.
//!
//! Only the fields this service reads are typed. Everything else the
//! upstream sends is kept in `extra` so proxy responses pass through
//! unchanged.

use chrono::{DateTime, Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Activity type tag (`type` on the Strava payload).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    Run,
    TrailRun,
    VirtualRun,
    Ride,
    Hike,
    Other(String),
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Run => "Run",
            ActivityType::TrailRun => "TrailRun",
            ActivityType::VirtualRun => "VirtualRun",
            ActivityType::Ride => "Ride",
            ActivityType::Hike => "Hike",
            ActivityType::Other(tag) => tag,
        }
    }

    /// Run, TrailRun and VirtualRun.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            ActivityType::Run | ActivityType::TrailRun | ActivityType::VirtualRun
        )
    }
}

impl From<String> for ActivityType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "Run" => ActivityType::Run,
            "TrailRun" => ActivityType::TrailRun,
            "VirtualRun" => ActivityType::VirtualRun,
            "Ride" => ActivityType::Ride,
            "Hike" => ActivityType::Hike,
            _ => ActivityType::Other(tag),
        }
    }
}

impl From<ActivityType> for String {
    fn from(kind: ActivityType) -> Self {
        match kind {
            ActivityType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

/// One recorded activity. Never mutated after it is fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Distance in meters
    #[serde(default)]
    pub distance: f64,
    /// Seconds
    #[serde(default)]
    pub moving_time: u64,
    /// Seconds
    #[serde(default)]
    pub elapsed_time: u64,
    /// Meters
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// ISO 8601, UTC
    #[serde(default)]
    pub start_date: String,
    /// ISO 8601, athlete's local time
    #[serde(default)]
    pub start_date_local: String,
    /// m/s
    #[serde(default)]
    pub average_speed: f64,
    /// m/s
    #[serde(default)]
    pub max_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<ActivityMap>,
    /// Only present on detail responses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub best_efforts: Vec<BestEffort>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    /// Encoded route, preferring the detailed polyline over the summary.
    ///
    /// Empty strings count as "no route" (treadmill runs report `""`).
    pub fn route(&self) -> Option<&str> {
        let map = self.map.as_ref()?;
        map.polyline
            .as_deref()
            .filter(|p| !p.is_empty())
            .or(map.summary_polyline.as_deref().filter(|p| !p.is_empty()))
    }

    pub fn has_route(&self) -> bool {
        self.route().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.activity_type.is_running()
    }

    /// A Run or VirtualRun recorded without GPS.
    pub fn is_treadmill(&self) -> bool {
        !self.has_route()
            && matches!(
                self.activity_type,
                ActivityType::Run | ActivityType::VirtualRun
            )
    }

    /// Local start time, if the upstream timestamp parses.
    pub fn start_local(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.start_date_local)
    }

    /// Calendar year of the local start time.
    pub fn start_year(&self) -> Option<i32> {
        self.start_local().map(|dt| dt.year())
    }

    /// Best effort segment by Strava's name (`"5k"`, `"10k"`, ...).
    pub fn best_effort(&self, name: &str) -> Option<&BestEffort> {
        self.best_efforts
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }
}

/// Strava sends local timestamps with a `Z` suffix even though they are not
/// UTC, so the offset is ignored and the wall-clock value kept.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok())
}

/// Activity map data with polylines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polyline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_polyline: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named PR segment from an activity detail (`best_efforts[]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestEffort {
    pub name: String,
    /// Seconds
    pub elapsed_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
