// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay logic for the Flight Replay viewer.
//!
//! This crate has no GPU or windowing dependencies. It provides:
//! - The flight path curve (position and heading at any progress)
//! - The event timeline shown as captions
//! - Camera viewpoints that track the aircraft
//! - The tracked object's load lifecycle
//! - The per-frame animation driver
//! - Scenario configuration stored as RON
//!
//! ## Frame flow
//!
//! The application keeps a [`ReplayState`] and calls
//! [`AnimationDriver::tick`] once per frame. The returned [`Frame`] holds
//! everything the renderer and UI need.

pub mod camera;
pub mod curve;
pub mod driver;
pub mod scenario;
pub mod timeline;
pub mod tracked;

pub use camera::{CameraLens, CameraMode, CameraRig, CameraView};
pub use curve::{clamp_progress, CurveError, FlightPath};
pub use driver::{progress_from_percent, AnimationDriver, Frame, ReplayState};
pub use scenario::{
    EnvironmentSettings, ModelSettings, Scenario, ScenarioError, DEFAULT_SCENARIO_PATH,
};
pub use timeline::{Timeline, TimelineError, TimelineEvent};
pub use tracked::{look_rotation, TrackedObject, TrackedObjectState};

pub use glam;
