//! Actor and body descriptors with validation.
//!
//! Descriptors are plain data: they are copied into the actor at creation
//! and can be mutated and reused by the caller afterwards.

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ActorError;
use crate::pose::Pose;
use crate::shape::ShapeDesc;
use crate::sleep::DEFAULT_WAKE_FRAMES;

// ============================================================================
// Flags
// ============================================================================

bitflags::bitflags! {
    /// Behavior switches for an actor.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct ActorFlags: u32 {
        /// Kinematic body: driven by move targets, unaffected by forces and
        /// gravity. Inert on actors without a body.
        const KINEMATIC = 1 << 0;
        /// Frozen: pose and velocities are held, no integration happens.
        const FROZEN = 1 << 1;
        /// Scene gravity is not applied to this actor.
        const DISABLE_GRAVITY = 1 << 2;
    }
}

impl Default for ActorFlags {
    fn default() -> Self {
        ActorFlags::empty()
    }
}

// ============================================================================
// Body descriptor
// ============================================================================

/// Dynamics state for an actor. Present on dynamic actors, absent on static
/// ones.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyDesc {
    /// Pose of the mass frame in actor space. Used only when an explicit
    /// inertia tensor is given; otherwise derived from the shapes.
    pub mass_local_pose: Pose,
    /// Diagonal inertia tensor in the mass frame (zero = derive from shapes).
    pub mass_space_inertia: Vec3,
    /// Explicit total mass (zero = derive from density and shapes).
    pub mass: f32,
    /// Initial linear velocity.
    pub linear_velocity: Vec3,
    /// Initial angular velocity.
    pub angular_velocity: Vec3,
    /// Linear velocity decay rate.
    pub linear_damping: f32,
    /// Angular velocity decay rate.
    pub angular_damping: f32,
    /// Cap on angular speed (None = scene default).
    pub max_angular_velocity: Option<f32>,
    /// Linear speed below which the body may fall asleep (None = scene
    /// default).
    pub sleep_linear_velocity: Option<f32>,
    /// Angular speed below which the body may fall asleep (None = scene
    /// default).
    pub sleep_angular_velocity: Option<f32>,
    /// Initial wake counter in steps.
    pub wake_frames: u32,
    /// Solver iterations requested for joints and contacts touching this
    /// body.
    pub solver_iteration_count: u32,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            mass_local_pose: Pose::IDENTITY,
            mass_space_inertia: Vec3::ZERO,
            mass: 0.0,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: 0.0,
            angular_damping: 0.05,
            max_angular_velocity: None,
            sleep_linear_velocity: None,
            sleep_angular_velocity: None,
            wake_frames: DEFAULT_WAKE_FRAMES,
            solver_iteration_count: 4,
        }
    }
}

impl BodyDesc {
    /// Sets an explicit total mass.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Sets an explicit diagonal inertia tensor.
    pub fn with_mass_space_inertia(mut self, inertia: Vec3) -> Self {
        self.mass_space_inertia = inertia;
        self
    }

    /// Sets the mass frame pose.
    pub fn with_mass_local_pose(mut self, pose: Pose) -> Self {
        self.mass_local_pose = pose;
        self
    }

    /// Sets the initial linear velocity.
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Sets the initial angular velocity.
    pub fn with_angular_velocity(mut self, velocity: Vec3) -> Self {
        self.angular_velocity = velocity;
        self
    }

    /// Sets the linear damping rate.
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Sets the angular damping rate.
    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }

    /// Caps the angular speed for this body.
    pub fn with_max_angular_velocity(mut self, max: f32) -> Self {
        self.max_angular_velocity = Some(max);
        self
    }

    /// Overrides the linear sleep threshold.
    pub fn with_sleep_linear_velocity(mut self, threshold: f32) -> Self {
        self.sleep_linear_velocity = Some(threshold);
        self
    }

    /// Overrides the angular sleep threshold.
    pub fn with_sleep_angular_velocity(mut self, threshold: f32) -> Self {
        self.sleep_angular_velocity = Some(threshold);
        self
    }

    /// Sets the initial wake counter.
    pub fn with_wake_frames(mut self, frames: u32) -> Self {
        self.wake_frames = frames;
        self
    }

    /// Sets the solver iteration count.
    pub fn with_solver_iteration_count(mut self, count: u32) -> Self {
        self.solver_iteration_count = count;
        self
    }

    /// True when every field is finite and in range.
    pub fn is_valid(&self) -> bool {
        self.mass_local_pose.is_finite()
            && self.mass_space_inertia.is_finite()
            && self.mass_space_inertia.min_element() >= 0.0
            && self.mass.is_finite()
            && self.mass >= 0.0
            && self.linear_velocity.is_finite()
            && self.angular_velocity.is_finite()
            && self.linear_damping.is_finite()
            && self.linear_damping >= 0.0
            && self.angular_damping.is_finite()
            && self.angular_damping >= 0.0
            && check_threshold(self.max_angular_velocity)
            && check_threshold(self.sleep_linear_velocity)
            && check_threshold(self.sleep_angular_velocity)
            && self.solver_iteration_count >= 1
    }
}

fn check_threshold(value: Option<f32>) -> bool {
    match value {
        Some(v) => v.is_finite() && v >= 0.0,
        None => true,
    }
}

// ============================================================================
// Actor descriptor
// ============================================================================

/// Everything needed to create an actor.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActorDesc {
    /// Pose of the actor in world space.
    pub global_pose: Pose,
    /// Dynamics state; `None` makes the actor static.
    pub body: Option<BodyDesc>,
    /// Density used to derive mass from the shapes (zero = unused).
    pub density: f32,
    /// Shapes attached at creation.
    pub shapes: Vec<ShapeDesc>,
    /// Behavior flags.
    pub flags: ActorFlags,
    /// Collision group, usable for island queries.
    pub group: u16,
    /// Free slot for caller bookkeeping.
    pub user_data: u64,
    /// Optional debug name.
    pub name: Option<String>,
}

impl ActorDesc {
    /// Creates a descriptor for a static actor at the given pose.
    pub fn new(global_pose: Pose) -> Self {
        Self {
            global_pose,
            ..Self::default()
        }
    }

    /// Attaches dynamics state, making the actor dynamic.
    pub fn with_body(mut self, body: BodyDesc) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the density for mass derivation.
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Appends a shape.
    pub fn with_shape(mut self, shape: ShapeDesc) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Sets the behavior flags.
    pub fn with_flags(mut self, flags: ActorFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the collision group.
    pub fn with_group(mut self, group: u16) -> Self {
        self.group = group;
        self
    }

    /// Sets the user data slot.
    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    /// Sets the debug name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Checks the descriptor, in particular its mass inputs.
    ///
    /// For a dynamic actor with shapes exactly one of these must hold:
    /// density alone, explicit mass alone, or explicit mass together with an
    /// inertia tensor. A dynamic actor without shapes must not carry a
    /// density, since there is no volume to apply it to. Descriptors without
    /// a body are static actors and skip the mass rules entirely.
    pub fn validate(&self) -> Result<(), ActorError> {
        if !self.global_pose.is_finite() {
            return Err(ActorError::InvalidDescriptor("global pose is not finite"));
        }
        if !self.density.is_finite() || self.density < 0.0 {
            return Err(ActorError::InvalidDescriptor(
                "density must be finite and non-negative",
            ));
        }
        for shape in &self.shapes {
            if !shape.is_valid() {
                return Err(ActorError::InvalidDescriptor("malformed shape"));
            }
        }
        let Some(body) = &self.body else {
            return Ok(());
        };
        if !body.is_valid() {
            return Err(ActorError::InvalidDescriptor("malformed body"));
        }

        let have_density = self.density != 0.0;
        let have_mass = body.mass != 0.0;
        let have_tensor = body.mass_space_inertia != Vec3::ZERO;
        if self.shapes.is_empty() {
            if have_density {
                return Err(ActorError::InvalidDescriptor("density given without shapes"));
            }
            return Ok(());
        }
        match (have_density, have_mass, have_tensor) {
            (true, false, false) | (false, true, false) | (false, true, true) => Ok(()),
            (true, true, _) => Err(ActorError::InvalidDescriptor("both density and mass given")),
            (true, false, true) => Err(ActorError::InvalidDescriptor(
                "density given with an inertia tensor",
            )),
            (false, false, true) => Err(ActorError::InvalidDescriptor(
                "inertia tensor given without mass",
            )),
            (false, false, false) => Err(ActorError::InvalidDescriptor(
                "no mass source for a dynamic actor",
            )),
        }
    }

    /// True when [`ActorDesc::validate`] passes.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeGeometry;

    fn with_shapes() -> ActorDesc {
        ActorDesc::new(Pose::IDENTITY).with_shape(ShapeDesc::new(ShapeGeometry::sphere(1.0)))
    }

    #[test]
    fn test_static_descriptor_is_valid() {
        assert!(ActorDesc::default().is_valid());
        assert!(with_shapes().is_valid());
        // Density on a static actor is unused but harmless.
        assert!(with_shapes().with_density(10.0).is_valid());
    }

    #[test]
    fn test_mass_source_truth_table_with_shapes() {
        let base = with_shapes();
        let body = BodyDesc::default();

        // Legal rows: density alone, mass alone, mass with tensor.
        assert!(base.clone().with_body(body).with_density(1.0).is_valid());
        assert!(base.clone().with_body(body.with_mass(2.0)).is_valid());
        assert!(base
            .clone()
            .with_body(body.with_mass(2.0).with_mass_space_inertia(Vec3::ONE))
            .is_valid());

        // Everything else is rejected.
        assert!(!base
            .clone()
            .with_body(body.with_mass(2.0))
            .with_density(1.0)
            .is_valid());
        assert!(!base
            .clone()
            .with_body(body.with_mass_space_inertia(Vec3::ONE))
            .with_density(1.0)
            .is_valid());
        assert!(!base
            .clone()
            .with_body(body.with_mass(2.0).with_mass_space_inertia(Vec3::ONE))
            .with_density(1.0)
            .is_valid());
        assert!(!base
            .clone()
            .with_body(body.with_mass_space_inertia(Vec3::ONE))
            .is_valid());
        assert!(!base.clone().with_body(body).is_valid());
    }

    #[test]
    fn test_shapeless_dynamic_rules() {
        let base = ActorDesc::new(Pose::IDENTITY);
        // Without shapes any mass configuration is accepted, except a
        // density, which has no volume to act on.
        assert!(base.clone().with_body(BodyDesc::default()).is_valid());
        assert!(base
            .clone()
            .with_body(BodyDesc::default().with_mass(3.0))
            .is_valid());
        assert!(base
            .clone()
            .with_body(
                BodyDesc::default()
                    .with_mass(3.0)
                    .with_mass_space_inertia(Vec3::ONE)
            )
            .is_valid());
        let err = base
            .clone()
            .with_body(BodyDesc::default())
            .with_density(1.0)
            .validate();
        assert_eq!(
            err,
            Err(ActorError::InvalidDescriptor("density given without shapes"))
        );
    }

    #[test]
    fn test_negative_density_rejected() {
        let desc = with_shapes().with_density(-1.0);
        assert!(!desc.is_valid());
    }

    #[test]
    fn test_non_finite_pose_rejected() {
        let desc = ActorDesc::new(Pose::from_translation(Vec3::splat(f32::INFINITY)));
        assert!(!desc.is_valid());
    }

    #[test]
    fn test_malformed_shape_rejected() {
        let desc = ActorDesc::new(Pose::IDENTITY)
            .with_shape(ShapeDesc::new(ShapeGeometry::sphere(-2.0)));
        assert!(!desc.is_valid());
    }

    #[test]
    fn test_malformed_body_rejected() {
        let desc = with_shapes()
            .with_body(BodyDesc::default().with_mass(f32::NAN))
            .with_density(0.0);
        assert!(!desc.is_valid());
        let desc = with_shapes().with_body(BodyDesc::default().with_linear_damping(-0.5));
        assert!(!desc.is_valid());
        let desc = with_shapes().with_body(BodyDesc::default().with_solver_iteration_count(0));
        assert!(!desc.is_valid());
    }

    #[test]
    fn test_body_desc_defaults() {
        let body = BodyDesc::default();
        assert_eq!(body.mass, 0.0);
        assert_eq!(body.linear_damping, 0.0);
        assert!((body.angular_damping - 0.05).abs() < 1e-6);
        assert_eq!(body.max_angular_velocity, None);
        assert_eq!(body.wake_frames, DEFAULT_WAKE_FRAMES);
        assert_eq!(body.solver_iteration_count, 4);
        assert!(body.is_valid());
    }

    #[test]
    fn test_flags_default_empty() {
        assert_eq!(ActorFlags::default(), ActorFlags::empty());
        let flags = ActorFlags::KINEMATIC | ActorFlags::DISABLE_GRAVITY;
        assert!(flags.contains(ActorFlags::KINEMATIC));
        assert!(!flags.contains(ActorFlags::FROZEN));
    }
}
