// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Display formatting for distances, durations, paces and dates.

use chrono::NaiveDateTime;

/// Kilometers with one decimal: `5000.0` → `"5.0"`.
pub fn format_distance(meters: f64) -> String {
    format!("{:.1}", meters / 1000.0)
}

/// `m:ss`, or `h:mm:ss` once the duration reaches an hour.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Pace per kilometer without the unit suffix, seconds floored.
///
/// Returns `None` when the distance is zero (nothing to divide by).
pub fn pace_per_km(meters: f64, seconds: u64) -> Option<String> {
    if meters.is_nan() || meters <= 0.0 {
        return None;
    }
    let pace_minutes = seconds as f64 / (meters / 1000.0) / 60.0;
    if !pace_minutes.is_finite() {
        return None;
    }
    let minutes = pace_minutes.floor();
    let secs = ((pace_minutes - minutes) * 60.0).floor();
    Some(format!("{}:{:02}", minutes as u64, secs as u64))
}

/// Card pace: `"4:00 /km"`, or `"--:-- /km"` for zero distance.
pub fn format_pace(meters: f64, seconds: u64) -> String {
    match pace_per_km(meters, seconds) {
        Some(pace) => format!("{} /km", pace),
        None => "--:-- /km".to_string(),
    }
}

/// Short US-style date: `"May 1, 2024"`.
pub fn format_date(date: NaiveDateTime) -> String {
    date.format("%b %-d, %Y").to_string()
}
