// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flight Replay - 3D reconstruction of an aircraft's final approach
//!
//! The replay shows:
//! - The aircraft flying a smooth path fitted through a few control points
//! - Captions that change as the timeline passes scripted events
//! - Three cameras: chase, control tower and a ground eyewitness
//! - A scrubbable timeline with a countdown to impact
//!
//! ## Architecture
//!
//! Path, timeline and camera logic live in `flight_replay_core`. This crate
//! owns the window, the wgpu renderer, the egui panels and the background
//! model loader.

mod app;
mod mesh;
mod model_loader;
mod panels;
mod viewport_renderer;

use app::FlightReplayApp;
use flight_replay_core::{Scenario, DEFAULT_SCENARIO_PATH};
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("flight_replay_app=debug".parse().unwrap())
        .add_directive("flight_replay_core=debug".parse().unwrap())
        .add_directive("wgpu=warn".parse().unwrap())
        .add_directive("naga=warn".parse().unwrap());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Flight Replay v{}", env!("CARGO_PKG_VERSION"));

    let scenario = Scenario::load_or_default(Path::new(DEFAULT_SCENARIO_PATH));

    if let Err(e) = FlightReplayApp::run(scenario) {
        tracing::error!("Replay failed: {e}");
        std::process::exit(1);
    }
}
