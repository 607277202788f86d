// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenario configuration.
//!
//! A scenario gathers every fixed value of a replay: the flight path, the
//! event captions, camera stations, the aircraft model and the look of the
//! environment. Scenarios are stored as RON; the built-in default is the
//! final sixty seconds of the approach.

use crate::camera::{CameraLens, CameraRig};
use crate::curve::CurveError;
use crate::driver::AnimationDriver;
use crate::timeline::{TimelineError, TimelineEvent};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default scenario file, relative to the working directory
pub const DEFAULT_SCENARIO_PATH: &str = "assets/scenario.ron";

/// Errors raised while loading or validating a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario file could not be read
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The scenario file is not valid RON
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The scenario could not be written as RON
    #[error("Failed to serialize scenario: {0}")]
    Serialize(#[from] ron::Error),

    /// The control points do not form a valid path
    #[error("Invalid flight path: {0}")]
    Curve(#[from] CurveError),

    /// The events do not form a valid timeline
    #[error("Invalid timeline: {0}")]
    Timeline(#[from] TimelineError),

    /// The replay duration is not a positive number of seconds
    #[error("Replay duration must be positive, got {0}s")]
    InvalidDuration(f32),
}

/// Aircraft model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model file to load
    pub path: PathBuf,
    /// Uniform scale applied to the model
    pub scale: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/models/aircraft.ron"),
            scale: 1.0,
        }
    }
}

/// Sky, fog, lighting and ground settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    /// Background color (sRGB)
    pub sky_color: [u8; 3],
    /// Fog color (sRGB)
    pub fog_color: [u8; 3],
    /// Distance where fog starts
    pub fog_near: f32,
    /// Distance where fog is opaque
    pub fog_far: f32,
    /// Ambient light color (sRGB)
    pub ambient_color: [u8; 3],
    /// Ambient light intensity
    pub ambient_intensity: f32,
    /// Position the directional light shines from, towards the origin
    pub sun_position: [f32; 3],
    /// Directional light intensity
    pub sun_intensity: f32,
    /// Ground color (sRGB)
    pub ground_color: [u8; 3],
    /// Edge length of the square ground plane
    pub ground_size: f32,
    /// Runway color (sRGB)
    pub runway_color: [u8; 3],
    /// Z coordinate of the runway threshold
    pub runway_start_z: f32,
    /// Runway length along +Z
    pub runway_length: f32,
    /// Runway width along X
    pub runway_width: f32,
    /// Color of the flight path line (sRGB)
    pub path_color: [u8; 3],
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            sky_color: [0x87, 0xCE, 0xEB],
            fog_color: [0xD3, 0xD3, 0xD3],
            fog_near: 100.0,
            fog_far: 1500.0,
            ambient_color: [0xCC, 0xCC, 0xCC],
            ambient_intensity: 0.6,
            sun_position: [0.0, 300.0, 500.0],
            sun_intensity: 0.8,
            ground_color: [0x55, 0x6B, 0x2F],
            ground_size: 10_000.0,
            runway_color: [0x3A, 0x3A, 0x3A],
            runway_start_z: 300.0,
            runway_length: 2500.0,
            runway_width: 45.0,
            path_color: [0xFF, 0x00, 0x00],
        }
    }
}

/// Everything needed to set up a replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Display name
    pub name: String,
    /// Simulated seconds covered by the full timeline
    pub duration_seconds: f32,
    /// Points the flight path passes through; Y is altitude, Z runs towards the runway
    pub control_points: Vec<[f32; 3]>,
    /// Captions, sorted by trigger time, the first at 0s
    pub events: Vec<TimelineEvent>,
    /// Camera stations
    pub cameras: CameraRig,
    /// Camera lens
    pub lens: CameraLens,
    /// Aircraft model
    pub model: ModelSettings,
    /// Environment
    pub environment: EnvironmentSettings,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Final Approach".to_string(),
            duration_seconds: 60.0,
            control_points: vec![
                [0.0, 300.0, -5000.0],
                [0.0, 150.0, -2500.0],
                [10.0, 30.0, -500.0],
                [15.0, 20.0, -200.0],
                [20.0, 5.0, 0.0],
            ],
            events: vec![
                TimelineEvent::new(
                    0.0,
                    "T-60s: Plane is on final approach, aligned with the runway but still high.",
                ),
                TimelineEvent::new(
                    30.0,
                    "T-30s: Crew continues descent in dense fog, below minimum safe altitude.",
                ),
                TimelineEvent::new(
                    50.0,
                    "T-10s: The aircraft is now critically low, flying just above the ground.",
                ),
                TimelineEvent::new(55.0, "T-5s: Impact with trees and a high-voltage power line."),
                TimelineEvent::new(60.0, "T-0s: The aircraft impacts the ground and breaks apart."),
            ],
            cameras: CameraRig::default(),
            lens: CameraLens::default(),
            model: ModelSettings::default(),
            environment: EnvironmentSettings::default(),
        }
    }
}

impl Scenario {
    /// Parse a scenario from RON text
    pub fn from_ron(text: &str) -> Result<Self, ScenarioError> {
        Ok(ron::from_str(text)?)
    }

    /// Serialize the scenario to pretty RON text
    pub fn to_ron(&self) -> Result<String, ScenarioError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Load and validate a scenario file
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_ron(&text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario file, falling back to the built-in scenario.
    ///
    /// A missing file is expected; any other failure is logged.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("No scenario at {}, using built-in scenario", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(scenario) => {
                tracing::info!("Loaded scenario '{}' from {}", scenario.name, path.display());
                scenario
            }
            Err(e) => {
                tracing::warn!("Ignoring scenario {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Control points as vectors
    pub fn control_points(&self) -> Vec<Vec3> {
        self.control_points.iter().copied().map(Vec3::from).collect()
    }

    /// Check that the scenario can drive a replay
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.build_driver().map(|_| ())
    }

    /// Build the animation driver for this scenario
    pub fn build_driver(&self) -> Result<AnimationDriver, ScenarioError> {
        AnimationDriver::from_scenario(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario() {
        let scenario = Scenario::default();
        assert_eq!(scenario.control_points.len(), 5);
        assert_eq!(scenario.events.len(), 5);
        assert_eq!(scenario.events[0].trigger_seconds, 0.0);
        assert_eq!(scenario.duration_seconds, 60.0);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let scenario = Scenario::default();
        let ron = scenario.to_ron().unwrap();
        let loaded = Scenario::from_ron(&ron).unwrap();
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded = Scenario::from_ron("(name: \"Short\", duration_seconds: 30.0)").unwrap();
        assert_eq!(loaded.name, "Short");
        assert_eq!(loaded.duration_seconds, 30.0);
        assert_eq!(loaded.cameras, CameraRig::default());
        assert_eq!(loaded.events, Scenario::default().events);
    }

    #[test]
    fn test_parse_error() {
        let err = Scenario::from_ron("(name: ").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn test_validation_errors() {
        let mut scenario = Scenario::default();
        scenario.control_points[2] = scenario.control_points[1];
        assert!(matches!(scenario.validate(), Err(ScenarioError::Curve(_))));

        let mut scenario = Scenario::default();
        scenario.events.clear();
        assert!(matches!(scenario.validate(), Err(ScenarioError::Timeline(_))));

        let mut scenario = Scenario::default();
        scenario.duration_seconds = 0.0;
        assert!(matches!(scenario.validate(), Err(ScenarioError::InvalidDuration(_))));
    }

    #[test]
    fn test_bundled_scenario_matches_default() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/scenario.ron");
        assert_eq!(Scenario::load(&path).unwrap(), Scenario::default());
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("does/not/exist/scenario.ron");
        assert!(matches!(Scenario::load(path), Err(ScenarioError::Io { .. })));
        assert_eq!(Scenario::load_or_default(path), Scenario::default());
    }
}
