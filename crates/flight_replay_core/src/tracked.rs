// SPDX-License-Identifier: MIT OR Apache-2.0
//! The animated aircraft and its load lifecycle.

use glam::{Mat3, Mat4, Quat, Vec3};

/// Position and orientation of the animated object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedObjectState {
    /// World position
    pub position: Vec3,
    /// Rotation from model space, where the nose points along +Z
    pub orientation: Quat,
}

impl Default for TrackedObjectState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl TrackedObjectState {
    /// Place the object at `position`, facing `position + direction`.
    pub fn face_along(&mut self, position: Vec3, direction: Vec3) {
        self.position = position;
        self.orientation = look_rotation(direction, Vec3::Y);
    }

    /// Direction the nose points in world space
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    /// Model matrix for a uniformly scaled model
    pub fn transform(&self, scale: f32) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(scale), self.orientation, self.position)
    }
}

/// Rotation that turns local +Z to `forward`, keeping local +Y close to `up`.
///
/// A zero `forward` gives the identity rotation.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let Some(forward) = forward.try_normalize() else {
        return Quat::IDENTITY;
    };
    let right = up
        .cross(forward)
        .try_normalize()
        .unwrap_or_else(|| forward.any_orthonormal_vector());
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

/// Slot holding the tracked object once its model has loaded
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedObject<H> {
    /// Model not available yet, or failed to load
    Unloaded,
    /// Model loaded and placed in the scene
    Loaded {
        /// Renderer-side handle for the model
        handle: H,
        /// Current pose, written by the animation driver
        state: TrackedObjectState,
    },
}

impl<H> Default for TrackedObject<H> {
    fn default() -> Self {
        Self::Unloaded
    }
}

impl<H> TrackedObject<H> {
    /// Publish a loaded model into the slot.
    ///
    /// The pose starts at the origin and is set on the next tick.
    pub fn publish(&mut self, handle: H) {
        *self = Self::Loaded {
            handle,
            state: TrackedObjectState::default(),
        };
    }

    /// Whether a model has been published
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// Handle of the loaded model
    pub fn handle(&self) -> Option<&H> {
        match self {
            Self::Loaded { handle, .. } => Some(handle),
            Self::Unloaded => None,
        }
    }

    /// Current pose of the loaded model
    pub fn state(&self) -> Option<&TrackedObjectState> {
        match self {
            Self::Loaded { state, .. } => Some(state),
            Self::Unloaded => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-5, "{a} != {b}");
    }

    #[test]
    fn test_look_rotation_identity() {
        let rotation = look_rotation(Vec3::Z, Vec3::Y);
        assert_near(rotation * Vec3::Z, Vec3::Z);
        assert_near(rotation * Vec3::Y, Vec3::Y);
    }

    #[test]
    fn test_look_rotation_keeps_wings_level() {
        let forward = Vec3::new(0.0, -0.06, 1.0).normalize();
        let rotation = look_rotation(forward, Vec3::Y);
        assert_near(rotation * Vec3::Z, forward);
        // Wing axis stays horizontal
        assert!((rotation * Vec3::X).y.abs() < 1e-5);
    }

    #[test]
    fn test_look_rotation_degenerate() {
        assert_eq!(look_rotation(Vec3::ZERO, Vec3::Y), Quat::IDENTITY);
        let straight_up = look_rotation(Vec3::Y, Vec3::Y);
        assert_near(straight_up * Vec3::Z, Vec3::Y);
    }

    #[test]
    fn test_face_along() {
        let mut state = TrackedObjectState::default();
        state.face_along(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 0.0, 0.0));
        assert_eq!(state.position, Vec3::new(1.0, 2.0, 3.0));
        assert_near(state.forward(), Vec3::NEG_X);
        assert_near(state.transform(2.0).transform_point3(Vec3::Z), Vec3::new(-1.0, 2.0, 3.0));
    }

    #[test]
    fn test_lifecycle() {
        let mut slot: TrackedObject<&str> = TrackedObject::default();
        assert!(!slot.is_loaded());
        assert_eq!(slot.handle(), None);
        assert_eq!(slot.state(), None);

        slot.publish("aircraft");
        assert!(slot.is_loaded());
        assert_eq!(slot.handle(), Some(&"aircraft"));
        assert_eq!(slot.state(), Some(&TrackedObjectState::default()));
    }
}
