// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod achievements;
pub mod browse;
pub mod compositor;
pub mod map_render;
pub mod polyline;
pub mod preview;
pub mod projection;
pub mod strava;

pub use compositor::ExportError;
pub use map_render::{MapRenderError, MapRenderer, RouteRasterizer};
pub use strava::{StravaClient, StravaError};
