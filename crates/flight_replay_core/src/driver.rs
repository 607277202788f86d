// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-frame animation driver.
//!
//! The driver owns the immutable replay data (path, timeline, camera
//! stations). Everything that changes between frames lives in
//! [`ReplayState`], which the application passes to [`AnimationDriver::tick`]
//! once per displayed frame.

use crate::camera::{CameraMode, CameraRig, CameraView};
use crate::curve::{clamp_progress, FlightPath};
use crate::scenario::{Scenario, ScenarioError};
use crate::timeline::Timeline;
use crate::tracked::{TrackedObject, TrackedObjectState};

/// Convert the timeline slider value (0 to 100) into progress in `[0, 1]`.
pub fn progress_from_percent(percent: f32) -> f32 {
    clamp_progress(percent / 100.0)
}

/// Mutable replay state, owned by the UI thread
#[derive(Debug, Clone)]
pub struct ReplayState<H> {
    /// Timeline slider value, 0 to 100
    pub timeline_percent: f32,
    /// Active camera mode
    pub camera_mode: CameraMode,
    /// The animated aircraft
    pub tracked: TrackedObject<H>,
}

impl<H> Default for ReplayState<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> ReplayState<H> {
    /// Create a new state at the start of the timeline
    pub fn new() -> Self {
        Self {
            timeline_percent: 0.0,
            camera_mode: CameraMode::default(),
            tracked: TrackedObject::Unloaded,
        }
    }

    /// Current progress in `[0, 1]`
    pub fn progress(&self) -> f32 {
        progress_from_percent(self.timeline_percent)
    }

    /// Switch the camera; takes effect on the next tick
    pub fn select_camera(&mut self, mode: CameraMode) {
        if self.camera_mode != mode {
            tracing::debug!("Camera mode: {}", mode.name());
            self.camera_mode = mode;
        }
    }
}

/// Everything the renderer and UI need for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<'a> {
    /// Progress along the path in `[0, 1]`
    pub progress: f32,
    /// Simulated seconds since the start of the replay
    pub elapsed_seconds: f32,
    /// Caption of the current timeline event
    pub description: &'a str,
    /// Camera placement
    pub view: CameraView,
    /// Aircraft pose, if its model has loaded
    pub object: Option<TrackedObjectState>,
}

/// Drives the path, timeline and camera from the replay state
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    path: FlightPath,
    timeline: Timeline,
    rig: CameraRig,
    duration_seconds: f32,
}

impl AnimationDriver {
    /// Create a driver from already validated parts
    pub fn new(path: FlightPath, timeline: Timeline, rig: CameraRig, duration_seconds: f32) -> Self {
        Self {
            path,
            timeline,
            rig,
            duration_seconds,
        }
    }

    /// Build the path and timeline described by a scenario
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ScenarioError> {
        if !(scenario.duration_seconds.is_finite() && scenario.duration_seconds > 0.0) {
            return Err(ScenarioError::InvalidDuration(scenario.duration_seconds));
        }
        let path = FlightPath::new(&scenario.control_points())?;
        let timeline = Timeline::new(scenario.events.clone())?;

        Ok(Self::new(
            path,
            timeline,
            scenario.cameras.clone(),
            scenario.duration_seconds,
        ))
    }

    /// The flight path
    pub fn path(&self) -> &FlightPath {
        &self.path
    }

    /// The event timeline
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The camera stations
    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    /// Length of the replay in simulated seconds
    pub fn duration_seconds(&self) -> f32 {
        self.duration_seconds
    }

    /// Simulated seconds elapsed at `progress`
    pub fn elapsed_seconds(&self, progress: f32) -> f32 {
        clamp_progress(progress) * self.duration_seconds
    }

    /// Whole seconds left until the end of the replay
    pub fn countdown_seconds(&self, elapsed_seconds: f32) -> u32 {
        (self.duration_seconds - elapsed_seconds).max(0.0).ceil() as u32
    }

    /// Advance one frame.
    ///
    /// Moves the aircraft (when loaded) to the slider position, picks the
    /// current caption and places the camera. Without an aircraft the camera
    /// aims at the point on the path where it would be.
    pub fn tick<'a, H>(&'a self, state: &mut ReplayState<H>) -> Frame<'a> {
        let progress = state.progress();

        let object = match &mut state.tracked {
            TrackedObject::Loaded { state: object, .. } => {
                let position = self.path.position_at(progress);
                let tangent = self.path.tangent_at(progress);
                object.face_along(position, tangent);
                Some(*object)
            }
            TrackedObject::Unloaded => None,
        };

        let elapsed_seconds = self.elapsed_seconds(progress);
        let description = self.timeline.description_at(elapsed_seconds);

        let target = object.map_or_else(|| self.path.position_at(progress), |o| o.position);
        let view = self.rig.compute_view(state.camera_mode, target);

        Frame {
            progress,
            elapsed_seconds,
            description,
            view,
            object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn driver() -> AnimationDriver {
        Scenario::default().build_driver().unwrap()
    }

    #[test]
    fn test_progress_from_percent() {
        assert_eq!(progress_from_percent(0.0), 0.0);
        assert_eq!(progress_from_percent(50.0), 0.5);
        assert_eq!(progress_from_percent(100.0), 1.0);
        assert_eq!(progress_from_percent(-20.0), 0.0);
        assert_eq!(progress_from_percent(250.0), 1.0);
        assert_eq!(progress_from_percent(f32::NAN), 0.0);
    }

    #[test]
    fn test_tick_moves_loaded_object() {
        let driver = driver();
        let mut state = ReplayState::new();
        state.tracked.publish(());
        state.timeline_percent = 50.0;

        let frame = driver.tick(&mut state);
        let object = frame.object.unwrap();
        assert_eq!(object.position, driver.path().position_at(0.5));
        assert!(object.forward().distance(driver.path().tangent_at(0.5)) < 1e-4);
        assert_eq!(state.tracked.state(), Some(&object));
        assert_eq!(frame.view.look_at, object.position);
        assert_eq!(frame.elapsed_seconds, 30.0);
        assert!(frame.description.starts_with("T-30s"));
    }

    #[test]
    fn test_tick_without_object() {
        let driver = driver();
        let mut state: ReplayState<()> = ReplayState::new();
        state.timeline_percent = 100.0;

        let frame = driver.tick(&mut state);
        assert_eq!(frame.object, None);
        assert!(!state.tracked.is_loaded());
        assert!(frame.description.starts_with("T-0s"));
        // Camera still follows the path
        assert_eq!(frame.view.look_at, driver.path().position_at(1.0));
    }

    #[test]
    fn test_camera_switch_leaves_object_alone() {
        let driver = driver();
        let mut state = ReplayState::new();
        state.tracked.publish(());
        state.timeline_percent = 80.0;

        let before = driver.tick(&mut state);
        state.select_camera(CameraMode::TowerCam);
        let after = driver.tick(&mut state);

        assert_eq!(before.object, after.object);
        assert_eq!(before.description, after.description);
        assert_ne!(before.view.position, after.view.position);
        assert_eq!(after.view.position, Vec3::new(200.0, 100.0, -50.0));
    }

    #[test]
    fn test_tick_is_repeatable() {
        let driver = driver();
        let mut state = ReplayState::new();
        state.tracked.publish(());
        state.timeline_percent = 37.5;
        state.select_camera(CameraMode::EyewitnessCam);

        assert_eq!(driver.tick(&mut state), driver.tick(&mut state));
    }

    #[test]
    fn test_countdown() {
        let driver = driver();
        assert_eq!(driver.countdown_seconds(0.0), 60);
        assert_eq!(driver.countdown_seconds(30.0), 30);
        assert_eq!(driver.countdown_seconds(59.5), 1);
        assert_eq!(driver.countdown_seconds(61.0), 0);
        assert_eq!(driver.elapsed_seconds(2.0), 60.0);
    }
}
