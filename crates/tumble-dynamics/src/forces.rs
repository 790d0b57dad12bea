//! Force and torque accumulation between steps.

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How an applied force or torque acts on a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ForceMode {
    /// Continuous force (mass * distance / time^2), integrated over the
    /// next step.
    Force,
    /// Instantaneous impulse (mass * distance / time), applied to the
    /// velocity immediately.
    Impulse,
}

/// Accumulated continuous force and torque, in world space about the center
/// of mass. Cleared after every step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceAccumulator {
    /// Pending force.
    pub force: Vec3,
    /// Pending torque.
    pub torque: Vec3,
}

impl ForceAccumulator {
    /// Adds a force through the center of mass.
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Adds a pure torque.
    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    /// Adds a force acting at an offset from the center of mass, picking up
    /// the induced torque.
    pub fn add_force_at_offset(&mut self, force: Vec3, offset: Vec3) {
        self.force += force;
        self.torque += offset.cross(force);
    }

    /// Resets both sums to zero.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.force == Vec3::ZERO && self.torque == Vec3::ZERO
    }
}
