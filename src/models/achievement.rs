// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Personal-best achievements derived from a set of runs.

use serde::Serialize;

use crate::models::Activity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AchievementKind {
    Fastest5K,
    Fastest10K,
    LongestRun,
    BestPace,
}

impl AchievementKind {
    pub fn label(self) -> &'static str {
        match self {
            AchievementKind::Fastest5K => "Fastest 5K",
            AchievementKind::Fastest10K => "Fastest 10K",
            AchievementKind::LongestRun => "Longest Run Ever",
            AchievementKind::BestPace => "Best Pace",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    #[serde(rename = "type")]
    pub kind: AchievementKind,
    pub label: &'static str,
    pub activity: Activity,
    /// Display value: "21:15", "42.2 km" or "4:15 /km"
    pub value: String,
    /// Display date of the activity ("May 1, 2024")
    pub date: String,
}
