// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Card customization: themes, badge icons and export naming.
//!
//! A `CardConfig` lives for one customization session and is never stored
//! server-side. It only shapes the rendered card and the export filename.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

use crate::format::{format_date, format_distance, format_duration, format_pace};
use crate::models::Activity;

/// Badge theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Orange,
    White,
    Black,
    Blue,
    Green,
    Yellow,
}

/// Resolved colors for a theme.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThemeColors {
    pub key: Theme,
    pub name: &'static str,
    pub icon_background: &'static str,
    pub icon_text: &'static str,
}

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::Orange,
        Theme::White,
        Theme::Black,
        Theme::Blue,
        Theme::Green,
        Theme::Yellow,
    ];

    pub fn colors(self) -> ThemeColors {
        let (name, icon_background, icon_text) = match self {
            Theme::Orange => ("Orange", "#f97316", "#ffffff"),
            Theme::White => ("White", "#ffffff", "#000000"),
            Theme::Black => ("Dark", "#000000", "#ffffff"),
            Theme::Blue => ("Blue", "#3b82f6", "#ffffff"),
            Theme::Green => ("Green", "#22c55e", "#ffffff"),
            Theme::Yellow => ("Yellow", "#facc15", "#000000"),
        };
        ThemeColors {
            key: self,
            name,
            icon_background,
            icon_text,
        }
    }
}

/// Badge icon (Material Symbols name) with its own accent color.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CardIcon {
    pub name: &'static str,
    pub label: &'static str,
    pub background: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct IconCategory {
    pub key: &'static str,
    pub label: &'static str,
    pub icons: &'static [CardIcon],
}

const fn icon(name: &'static str, label: &'static str, background: &'static str) -> CardIcon {
    CardIcon {
        name,
        label,
        background,
    }
}

pub const ICON_CATEGORIES: &[IconCategory] = &[
    IconCategory {
        key: "achievements",
        label: "Achievements",
        icons: &[
            icon("grade", "Star", "#facc15"),
            icon("local_fire_department", "Fire", "#f97316"),
            icon("emoji_events", "Trophy", "#fbbf24"),
            icon("military_tech", "Medal", "#4ade80"),
        ],
    },
    IconCategory {
        key: "activity",
        label: "Activity",
        icons: &[
            icon("directions_run", "Runner", "#c084fc"),
            icon("footprint", "Footprint", "#f472b6"),
            icon("landscape", "Mountain", "#22d3ee"),
            icon("forest", "Trail", "#2dd4bf"),
        ],
    },
    IconCategory {
        key: "mood",
        label: "Mood",
        icons: &[
            icon("bolt", "Lightning", "#60a5fa"),
            icon("wb_twilight", "Sunrise", "#818cf8"),
            icon("nights_stay", "Night", "#a78bfa"),
            icon("favorite", "Heart", "#f87171"),
        ],
    },
    IconCategory {
        key: "performance",
        label: "Performance",
        icons: &[
            icon("speed", "Speed", "#fb923c"),
            icon("trending_up", "Progress", "#4ade80"),
            icon("fitness_center", "Strength", "#60a5fa"),
            icon("track_changes", "Target", "#c084fc"),
        ],
    },
];

pub fn find_icon(name: &str) -> Option<&'static CardIcon> {
    ICON_CATEGORIES
        .iter()
        .flat_map(|c| c.icons.iter())
        .find(|i| i.name == name)
}

/// Export aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "4:5")]
    Portrait,
    #[serde(rename = "9:16")]
    Story,
}

impl AspectRatio {
    pub fn tag(self) -> &'static str {
        match self {
            AspectRatio::Portrait => "4:5",
            AspectRatio::Story => "9:16",
        }
    }
}

/// Display-ready numbers for one activity card or browser tile.
///
/// Duration and pace use `moving_time`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CardSummary {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Kilometers, one decimal ("5.0")
    pub distance: String,
    pub duration: String,
    pub pace: String,
    pub date: String,
    /// Whole meters
    pub elevation: i64,
    pub has_route: bool,
    pub is_treadmill: bool,
}

impl CardSummary {
    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            id: activity.id,
            name: activity.name.clone(),
            activity_type: activity.activity_type.as_str().to_string(),
            distance: format_distance(activity.distance),
            duration: format_duration(activity.moving_time),
            pace: format_pace(activity.distance, activity.moving_time),
            date: activity.start_local().map(format_date).unwrap_or_default(),
            elevation: activity.total_elevation_gain.round() as i64,
            has_route: activity.has_route(),
            is_treadmill: activity.is_treadmill(),
        }
    }
}

/// Per-session card customization.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CardConfig {
    #[serde(default = "default_icon")]
    #[validate(custom(function = "known_icon"))]
    pub icon: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    #[validate(length(max = 60))]
    pub custom_label: String,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub personal_quote: String,
}

fn known_icon(name: &str) -> Result<(), ValidationError> {
    match find_icon(name) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("unknown_icon")),
    }
}

fn default_icon() -> String {
    "grade".to_string()
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            icon: default_icon(),
            theme: Theme::default(),
            custom_label: String::new(),
            personal_quote: String::new(),
        }
    }
}

impl CardConfig {
    pub fn export_filename(&self, aspect: AspectRatio) -> String {
        export_filename(&self.custom_label, aspect)
    }

    /// Selected badge icon, falling back to the default star.
    pub fn badge(&self) -> &'static CardIcon {
        find_icon(&self.icon).unwrap_or(&ICON_CATEGORIES[0].icons[0])
    }
}

/// `runstat-<label>-<aspect>.png`, label lower-cased with whitespace runs
/// collapsed to a single `-`. Control characters, quotes and backslashes are
/// dropped so the name always fits in a `Content-Disposition` header.
pub fn export_filename(label: &str, aspect: AspectRatio) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut in_space = false;
    for ch in label.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else if !(ch.is_control() || ch == '"' || ch == '\\') {
            slug.push(ch);
            in_space = false;
        }
    }
    format!("runstat-{}-{}.png", slug, aspect.tag())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename("Sunday  Long Run", AspectRatio::Portrait),
            "runstat-sunday-long-run-4:5.png"
        );
        assert_eq!(
            export_filename("PR", AspectRatio::Story),
            "runstat-pr-9:16.png"
        );
    }

    #[test]
    fn test_export_filename_drops_control_characters() {
        assert_eq!(
            export_filename("Race\u{1} \"Day\"\u{7f}\\", AspectRatio::Portrait),
            "runstat-race-day-4:5.png"
        );
        assert_eq!(
            export_filename("Tab\tand\nnewline", AspectRatio::Story),
            "runstat-tab-and-newline-9:16.png"
        );
    }

    #[test]
    fn test_card_config_validation() {
        let config: CardConfig = serde_json::from_value(serde_json::json!({
            "icon": "bolt",
            "theme": "blue",
            "custom_label": "Sunday Long Run"
        }))
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.badge().label, "Lightning");

        let config = CardConfig {
            icon: "rocket".to_string(),
            custom_label: "x".repeat(61),
            ..CardConfig::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("icon"));
        assert!(errors.field_errors().contains_key("custom_label"));
        assert_eq!(config.badge().name, "grade");
    }

    #[test]
    fn test_empty_label_keeps_shape() {
        assert_eq!(
            CardConfig::default().export_filename(AspectRatio::Portrait),
            "runstat--4:5.png"
        );
    }

    #[test]
    fn test_aspect_serde_tags() {
        assert_eq!(serde_json::to_string(&AspectRatio::Story).unwrap(), "\"9:16\"");
        let parsed: AspectRatio = serde_json::from_str("\"4:5\"").unwrap();
        assert_eq!(parsed, AspectRatio::Portrait);
    }

    #[test]
    fn test_summary_uses_moving_time() {
        let activity: Activity = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Tempo",
            "distance": 5000.0,
            "moving_time": 1200,
            "elapsed_time": 1500,
            "total_elevation_gain": 12.6,
            "type": "Run",
            "start_date_local": "2024-05-01T07:00:00Z"
        }))
        .unwrap();

        let summary = CardSummary::from_activity(&activity);
        assert_eq!(summary.distance, "5.0");
        assert_eq!(summary.duration, "20:00");
        assert_eq!(summary.pace, "4:00 /km");
        assert_eq!(summary.date, "May 1, 2024");
        assert_eq!(summary.elevation, 13);
        assert!(!summary.has_route);
        assert!(summary.is_treadmill);
    }

    #[test]
    fn test_icon_lookup() {
        assert_eq!(find_icon("bolt").map(|i| i.label), Some("Lightning"));
        assert!(find_icon("unknown").is_none());
        assert_eq!(Theme::Black.colors().name, "Dark");
    }
}
