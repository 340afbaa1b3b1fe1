// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod achievement;
pub mod activity;
pub mod card;

pub use achievement::{Achievement, AchievementKind};
pub use activity::{Activity, ActivityMap, ActivityType, BestEffort};
pub use card::{AspectRatio, CardConfig, CardIcon, CardSummary, IconCategory, Theme};
