//! Rigid transforms for actor and shape placement.
//!
//! Provides the `Pose` type: a rotation followed by a translation, with no
//! scale component.

use glam::{Mat3, Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rigid transform: rotation followed by translation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position in the parent frame.
    pub translation: Vec3,
    /// Orientation as quaternion.
    pub rotation: Quat,
}

impl Pose {
    /// The identity pose.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Creates a pose from translation and rotation.
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Creates a pose from translation only.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// Creates a pose from rotation only.
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation,
        }
    }

    /// Transforms a point from local space into the parent frame.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }

    /// Transforms a point from the parent frame into local space.
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.translation)
    }

    /// Rotates a vector into the parent frame, ignoring translation.
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    /// Composes this pose with another (`self * other`).
    ///
    /// The result maps a point through `other` first, then through `self`.
    pub fn then(&self, other: &Pose) -> Pose {
        Pose {
            translation: self.translation + self.rotation * other.translation,
            rotation: self.rotation * other.rotation,
        }
    }

    /// Returns the inverse pose.
    pub fn inverse(&self) -> Pose {
        let inv_rotation = self.rotation.inverse();
        Pose {
            translation: inv_rotation * -self.translation,
            rotation: inv_rotation,
        }
    }

    /// The rotation as a 3x3 matrix.
    pub fn rotation_matrix(&self) -> Mat3 {
        Mat3::from_quat(self.rotation)
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_maps_points_unchanged() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Pose::IDENTITY.transform_point(p), p);
        assert_eq!(Pose::default(), Pose::IDENTITY);
    }

    #[test]
    fn test_translation_only() {
        let pose = Pose::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let p = pose.transform_point(Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(p, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_rotation_about_z() {
        let pose = Pose::from_rotation(Quat::from_rotation_z(FRAC_PI_2));
        let p = pose.transform_point(Vec3::X);
        assert!((p - Vec3::Y).length() < 1e-5, "p = {:?}", p);
    }

    #[test]
    fn test_compose_then() {
        let a = Pose::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let b = Pose::from_rotation(Quat::from_rotation_z(FRAC_PI_2));
        // Point goes through b (rotate X to Y), then through a (shift +X).
        let p = a.then(&b).transform_point(Vec3::X);
        assert!((p - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5, "p = {:?}", p);
    }

    #[test]
    fn test_inverse_round_trip() {
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.7));
        let composed = pose.then(&pose.inverse());
        assert!(composed.translation.length() < 1e-5);
        assert!(
            (composed.rotation.w.abs() - 1.0).abs() < 1e-5,
            "rotation = {:?}",
            composed.rotation
        );
    }

    #[test]
    fn test_inverse_transform_point() {
        let pose = Pose::new(Vec3::new(0.0, 5.0, 0.0), Quat::from_rotation_x(1.2));
        let p = Vec3::new(1.0, -2.0, 0.5);
        let back = pose.inverse_transform_point(pose.transform_point(p));
        assert!((back - p).length() < 1e-5, "back = {:?}", back);
    }

    #[test]
    fn test_vector_ignores_translation() {
        let pose = Pose::new(Vec3::splat(10.0), Quat::from_rotation_z(FRAC_PI_2));
        let v = pose.transform_vector(Vec3::X);
        assert!((v - Vec3::Y).length() < 1e-5, "v = {:?}", v);
    }

    #[test]
    fn test_is_finite() {
        assert!(Pose::IDENTITY.is_finite());
        let bad = Pose::from_translation(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(!bad.is_finite());
    }
}
