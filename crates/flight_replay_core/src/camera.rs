// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera viewpoints.
//!
//! Every mode looks at the tracked aircraft; they differ only in where the
//! camera stands. Switching modes is instantaneous.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Viewpoint strategy selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraMode {
    /// Chase camera behind and above the aircraft
    #[default]
    FollowCam,
    /// Fixed observer in the tower near the runway
    TowerCam,
    /// Fixed observer on the ground, far from the path
    EyewitnessCam,
}

impl CameraMode {
    /// All modes, in toolbar order
    pub const ALL: [Self; 3] = [Self::FollowCam, Self::TowerCam, Self::EyewitnessCam];

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::FollowCam => "Follow Cam",
            Self::TowerCam => "Tower Cam",
            Self::EyewitnessCam => "Eyewitness Cam",
        }
    }

    /// Get a short description for tooltips
    pub fn description(&self) -> &'static str {
        match self {
            Self::FollowCam => "Chase view from behind the aircraft",
            Self::TowerCam => "View from the control tower near the runway",
            Self::EyewitnessCam => "View from a ground observer along the approach",
        }
    }
}

/// Camera placement for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// Camera position in world space
    pub position: Vec3,
    /// Point the camera looks at
    pub look_at: Vec3,
}

impl CameraView {
    /// Right-handed view matrix with +Y up
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }

    /// Distance from the camera to its look-at point
    pub fn distance(&self) -> f32 {
        self.position.distance(self.look_at)
    }
}

/// Camera stations for each mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraRig {
    /// Offset from the aircraft for the follow camera
    pub follow_offset: [f32; 3],
    /// Fixed tower camera position
    pub tower_position: [f32; 3],
    /// Fixed eyewitness camera position
    pub eyewitness_position: [f32; 3],
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            follow_offset: [-50.0, 20.0, -100.0],
            tower_position: [200.0, 100.0, -50.0],
            eyewitness_position: [100.0, 20.0, -1500.0],
        }
    }
}

impl CameraRig {
    /// Compute where the camera stands and what it looks at.
    ///
    /// Pure: the same inputs always give the same view.
    pub fn compute_view(&self, mode: CameraMode, target: Vec3) -> CameraView {
        let position = match mode {
            CameraMode::FollowCam => target + Vec3::from(self.follow_offset),
            CameraMode::TowerCam => Vec3::from(self.tower_position),
            CameraMode::EyewitnessCam => Vec3::from(self.eyewitness_position),
        };

        CameraView {
            position,
            look_at: target,
        }
    }
}

/// Perspective lens settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraLens {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Default for CameraLens {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 5000.0,
        }
    }
}

impl CameraLens {
    /// Projection matrix with a `[0, 1]` depth range
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            aspect.max(f32::EPSILON),
            self.near,
            self.far,
        )
    }
}
