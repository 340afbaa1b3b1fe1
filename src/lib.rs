// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! RunStat: shareable cards for Strava runs
//!
//! This crate provides the backend API: Strava OAuth with a cookie session,
//! activity proxying and browsing, route decoding and projection, route
//! rasterization, and card image compositing.

pub mod config;
pub mod error;
pub mod format;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{MapRenderer, StravaClient};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub strava: StravaClient,
    pub map_renderer: Arc<dyn MapRenderer>,
}

impl AppState {
    pub fn new(config: Config, map_renderer: Arc<dyn MapRenderer>) -> Self {
        let strava = StravaClient::new(&config);
        Self {
            config,
            strava,
            map_renderer,
        }
    }
}
