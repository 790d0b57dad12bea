//! Rigid body actors.
//!
//! An actor is a pose plus optional dynamics state (the body). Static actors
//! are just a placed shape set; dynamic actors carry mass properties,
//! velocities, accumulated forces, and sleep state. Actors live in a
//! [`Scene`](crate::Scene) and are addressed by slot id.

use glam::{Mat3, Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::descriptor::{ActorDesc, ActorFlags, BodyDesc};
use crate::error::ActorError;
use crate::forces::{ForceAccumulator, ForceMode};
use crate::mass::MassProperties;
use crate::pose::Pose;
use crate::shape::ShapeDesc;
use crate::sleep::{SleepControl, SleepState, DEFAULT_WAKE_FRAMES};

// ============================================================================
// Body
// ============================================================================

/// Dynamics state carried by dynamic actors.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct Body {
    /// Total mass (0 = no linear response).
    pub mass: f32,
    /// Inverse mass (cached).
    pub inv_mass: f32,
    /// Diagonal inertia tensor in the mass frame.
    pub inertia: Vec3,
    /// Inverse inertia tensor (cached).
    pub inv_inertia: Vec3,
    /// Pose of the mass frame in actor space.
    pub mass_local_pose: Pose,
    /// Linear velocity of the center of mass, world space.
    pub linear_velocity: Vec3,
    /// Angular velocity, world space.
    pub angular_velocity: Vec3,
    /// Linear velocity decay rate.
    pub linear_damping: f32,
    /// Angular velocity decay rate.
    pub angular_damping: f32,
    /// Angular speed cap (None = scene default).
    pub max_angular_velocity: Option<f32>,
    /// Solver iterations requested by this body.
    pub solver_iteration_count: u32,
    /// Forces and torques pending for the next step.
    pub accumulator: ForceAccumulator,
    /// Sleep state and wake counter.
    pub sleep: SleepControl,
    /// Pose a kinematic body should reach by the end of the next step.
    pub kinematic_target: Option<Pose>,
}

impl Body {
    fn from_desc(desc: &BodyDesc, actor: &ActorDesc) -> Self {
        let props = if desc.mass != 0.0 && desc.mass_space_inertia != Vec3::ZERO {
            MassProperties {
                mass: desc.mass,
                local_pose: desc.mass_local_pose,
                inertia: desc.mass_space_inertia,
            }
        } else if desc.mass != 0.0 {
            MassProperties::from_shapes_total_mass(&actor.shapes, desc.mass)
        } else if actor.density != 0.0 {
            MassProperties::from_shapes_density(&actor.shapes, actor.density)
        } else {
            MassProperties::ZERO
        };
        let mut sleep = SleepControl::new(desc.wake_frames);
        sleep.linear_threshold = desc.sleep_linear_velocity;
        sleep.angular_threshold = desc.sleep_angular_velocity;
        Self {
            mass: props.mass,
            inv_mass: inv_or_zero(props.mass),
            inertia: props.inertia,
            inv_inertia: inv_vec(props.inertia),
            mass_local_pose: props.local_pose,
            linear_velocity: desc.linear_velocity,
            angular_velocity: desc.angular_velocity,
            linear_damping: desc.linear_damping,
            angular_damping: desc.angular_damping,
            max_angular_velocity: desc.max_angular_velocity,
            solver_iteration_count: desc.solver_iteration_count,
            accumulator: ForceAccumulator::default(),
            sleep,
            kinematic_target: None,
        }
    }

    fn to_desc(&self) -> BodyDesc {
        BodyDesc {
            mass_local_pose: self.mass_local_pose,
            mass_space_inertia: self.inertia,
            mass: self.mass,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            max_angular_velocity: self.max_angular_velocity,
            sleep_linear_velocity: self.sleep.linear_threshold,
            sleep_angular_velocity: self.sleep.angular_threshold,
            wake_frames: self.sleep.wake_frames,
            solver_iteration_count: self.solver_iteration_count,
        }
    }

    fn apply_mass_properties(&mut self, props: MassProperties) {
        self.mass = props.mass;
        self.inv_mass = inv_or_zero(props.mass);
        self.inertia = props.inertia;
        self.inv_inertia = inv_vec(props.inertia);
        self.mass_local_pose = props.local_pose;
    }

    /// Applies the world space inertia tensor to a vector.
    pub fn inertia_world_mul(&self, actor_rotation: Quat, v: Vec3) -> Vec3 {
        let rot = actor_rotation * self.mass_local_pose.rotation;
        rot * (self.inertia * (rot.inverse() * v))
    }

    /// Applies the inverse world space inertia tensor to a vector.
    pub fn inv_inertia_world_mul(&self, actor_rotation: Quat, v: Vec3) -> Vec3 {
        let rot = actor_rotation * self.mass_local_pose.rotation;
        rot * (self.inv_inertia * (rot.inverse() * v))
    }
}

fn inv_or_zero(v: f32) -> f32 {
    if v > 0.0 {
        1.0 / v
    } else {
        0.0
    }
}

fn inv_vec(v: Vec3) -> Vec3 {
    Vec3::new(inv_or_zero(v.x), inv_or_zero(v.y), inv_or_zero(v.z))
}

// ============================================================================
// Actor
// ============================================================================

/// A rigid body actor: world pose, optional dynamics, and attached shapes.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Actor {
    /// Free slot for caller bookkeeping.
    pub user_data: u64,
    pub(crate) global_pose: Pose,
    pub(crate) body: Option<Body>,
    shapes: Vec<ShapeDesc>,
    flags: ActorFlags,
    group: u16,
    name: Option<String>,
    joints_stale: bool,
}

impl Actor {
    pub(crate) fn from_desc(desc: &ActorDesc) -> Result<Self, ActorError> {
        desc.validate()?;
        Ok(Self {
            user_data: desc.user_data,
            global_pose: desc.global_pose,
            body: desc.body.as_ref().map(|b| Body::from_desc(b, desc)),
            shapes: desc.shapes.clone(),
            flags: desc.flags,
            group: desc.group,
            name: desc.name.clone(),
            joints_stale: false,
        })
    }

    fn body_or(&self, op: &'static str) -> Result<&Body, ActorError> {
        self.body.as_ref().ok_or(ActorError::StaticActor(op))
    }

    fn body_mut_or(&mut self, op: &'static str) -> Result<&mut Body, ActorError> {
        self.body.as_mut().ok_or(ActorError::StaticActor(op))
    }

    fn note_pose_change(&mut self) {
        self.joints_stale = true;
        if let Some(body) = self.body.as_mut() {
            body.sleep.wake(DEFAULT_WAKE_FRAMES);
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// True when the actor carries dynamics state.
    pub fn is_dynamic(&self) -> bool {
        self.body.is_some()
    }

    /// True for a dynamic actor with the kinematic flag raised.
    pub fn is_kinematic(&self) -> bool {
        self.body.is_some() && self.flags.contains(ActorFlags::KINEMATIC)
    }

    /// The debug name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the debug name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// The collision group.
    pub fn group(&self) -> u16 {
        self.group
    }

    /// Sets the collision group.
    pub fn set_group(&mut self, group: u16) {
        self.group = group;
    }

    /// The current behavior flags.
    pub fn flags(&self) -> ActorFlags {
        self.flags
    }

    /// Raises the given flags.
    pub fn raise_flag(&mut self, flag: ActorFlags) {
        self.flags.insert(flag);
    }

    /// Clears the given flags.
    pub fn clear_flag(&mut self, flag: ActorFlags) {
        self.flags.remove(flag);
    }

    /// True when all of the given flags are raised.
    pub fn read_flag(&self, flag: ActorFlags) -> bool {
        self.flags.contains(flag)
    }

    // ------------------------------------------------------------------
    // Pose
    // ------------------------------------------------------------------

    /// The actor's pose in world space.
    pub fn global_pose(&self) -> Pose {
        self.global_pose
    }

    /// The actor's position in world space.
    pub fn global_position(&self) -> Vec3 {
        self.global_pose.translation
    }

    /// The actor's orientation in world space.
    pub fn global_orientation(&self) -> Quat {
        self.global_pose.rotation
    }

    /// Teleports the actor. Wakes it and leaves attached joint frames stale.
    pub fn set_global_pose(&mut self, pose: Pose) -> Result<(), ActorError> {
        if !pose.is_finite() {
            return Err(ActorError::InvalidInput("set_global_pose"));
        }
        self.global_pose = pose;
        self.note_pose_change();
        Ok(())
    }

    /// Teleports the actor, keeping its orientation.
    pub fn set_global_position(&mut self, position: Vec3) -> Result<(), ActorError> {
        if !position.is_finite() {
            return Err(ActorError::InvalidInput("set_global_position"));
        }
        self.global_pose.translation = position;
        self.note_pose_change();
        Ok(())
    }

    /// Reorients the actor in place.
    pub fn set_global_orientation(&mut self, orientation: Quat) -> Result<(), ActorError> {
        if !orientation.is_finite() {
            return Err(ActorError::InvalidInput("set_global_orientation"));
        }
        self.global_pose.rotation = orientation;
        self.note_pose_change();
        Ok(())
    }

    /// True after a teleport until [`Actor::mark_joints_synced`] is called.
    ///
    /// Anything keeping world space joint frames against this actor should
    /// refresh them when this reads true.
    pub fn joints_stale(&self) -> bool {
        self.joints_stale
    }

    /// Acknowledges a teleport after joint frames were refreshed.
    pub fn mark_joints_synced(&mut self) {
        self.joints_stale = false;
    }

    // ------------------------------------------------------------------
    // Velocity and momentum
    // ------------------------------------------------------------------

    /// Linear velocity of the center of mass (zero for static actors).
    pub fn linear_velocity(&self) -> Vec3 {
        self.body.as_ref().map_or(Vec3::ZERO, |b| b.linear_velocity)
    }

    /// Sets the linear velocity and wakes the actor.
    pub fn set_linear_velocity(&mut self, velocity: Vec3) -> Result<(), ActorError> {
        if !velocity.is_finite() {
            return Err(ActorError::InvalidInput("set_linear_velocity"));
        }
        let body = self.body_mut_or("set_linear_velocity")?;
        body.linear_velocity = velocity;
        body.sleep.wake(DEFAULT_WAKE_FRAMES);
        Ok(())
    }

    /// Angular velocity (zero for static actors).
    pub fn angular_velocity(&self) -> Vec3 {
        self.body
            .as_ref()
            .map_or(Vec3::ZERO, |b| b.angular_velocity)
    }

    /// Sets the angular velocity and wakes the actor.
    pub fn set_angular_velocity(&mut self, velocity: Vec3) -> Result<(), ActorError> {
        if !velocity.is_finite() {
            return Err(ActorError::InvalidInput("set_angular_velocity"));
        }
        let body = self.body_mut_or("set_angular_velocity")?;
        body.angular_velocity = velocity;
        body.sleep.wake(DEFAULT_WAKE_FRAMES);
        Ok(())
    }

    /// Linear momentum `m * v` (zero for static actors).
    pub fn linear_momentum(&self) -> Vec3 {
        self.body
            .as_ref()
            .map_or(Vec3::ZERO, |b| b.linear_velocity * b.mass)
    }

    /// Sets the linear velocity from a momentum.
    pub fn set_linear_momentum(&mut self, momentum: Vec3) -> Result<(), ActorError> {
        if !momentum.is_finite() {
            return Err(ActorError::InvalidInput("set_linear_momentum"));
        }
        let body = self.body_mut_or("set_linear_momentum")?;
        body.linear_velocity = momentum * body.inv_mass;
        body.sleep.wake(DEFAULT_WAKE_FRAMES);
        Ok(())
    }

    /// Angular momentum `I * w` in world space (zero for static actors).
    pub fn angular_momentum(&self) -> Vec3 {
        let Some(body) = &self.body else {
            return Vec3::ZERO;
        };
        body.inertia_world_mul(self.global_pose.rotation, body.angular_velocity)
    }

    /// Sets the angular velocity from a momentum.
    pub fn set_angular_momentum(&mut self, momentum: Vec3) -> Result<(), ActorError> {
        if !momentum.is_finite() {
            return Err(ActorError::InvalidInput("set_angular_momentum"));
        }
        let rotation = self.global_pose.rotation;
        let body = self.body_mut_or("set_angular_momentum")?;
        body.angular_velocity = body.inv_inertia_world_mul(rotation, momentum);
        body.sleep.wake(DEFAULT_WAKE_FRAMES);
        Ok(())
    }

    /// Velocity of the body at a world space point, `v + w x r`.
    pub fn velocity_at_point(&self, point: Vec3) -> Vec3 {
        let Some(body) = &self.body else {
            return Vec3::ZERO;
        };
        let com = self.global_pose.transform_point(body.mass_local_pose.translation);
        body.linear_velocity + body.angular_velocity.cross(point - com)
    }

    /// Velocity of the body at a point given in actor space.
    pub fn velocity_at_local_point(&self, point: Vec3) -> Vec3 {
        self.velocity_at_point(self.global_pose.transform_point(point))
    }

    /// Linear velocity decay rate.
    pub fn linear_damping(&self) -> f32 {
        self.body.as_ref().map_or(0.0, |b| b.linear_damping)
    }

    /// Sets the linear damping rate.
    pub fn set_linear_damping(&mut self, damping: f32) -> Result<(), ActorError> {
        if !damping.is_finite() || damping < 0.0 {
            return Err(ActorError::InvalidInput("set_linear_damping"));
        }
        self.body_mut_or("set_linear_damping")?.linear_damping = damping;
        Ok(())
    }

    /// Angular velocity decay rate.
    pub fn angular_damping(&self) -> f32 {
        self.body.as_ref().map_or(0.0, |b| b.angular_damping)
    }

    /// Sets the angular damping rate.
    pub fn set_angular_damping(&mut self, damping: f32) -> Result<(), ActorError> {
        if !damping.is_finite() || damping < 0.0 {
            return Err(ActorError::InvalidInput("set_angular_damping"));
        }
        self.body_mut_or("set_angular_damping")?.angular_damping = damping;
        Ok(())
    }

    /// Per-actor angular speed cap, if one overrides the scene default.
    pub fn max_angular_velocity(&self) -> Option<f32> {
        self.body.as_ref().and_then(|b| b.max_angular_velocity)
    }

    /// Caps the angular speed. A negative value drops the override and the
    /// scene default applies again.
    pub fn set_max_angular_velocity(&mut self, max: f32) -> Result<(), ActorError> {
        if max.is_nan() || max == f32::INFINITY {
            return Err(ActorError::InvalidInput("set_max_angular_velocity"));
        }
        let body = self.body_mut_or("set_max_angular_velocity")?;
        body.max_angular_velocity = if max < 0.0 { None } else { Some(max) };
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mass properties
    // ------------------------------------------------------------------

    /// Total mass (zero for static actors).
    pub fn mass(&self) -> f32 {
        self.body.as_ref().map_or(0.0, |b| b.mass)
    }

    /// Sets the total mass. Zero removes all linear response.
    pub fn set_mass(&mut self, mass: f32) -> Result<(), ActorError> {
        if !mass.is_finite() || mass < 0.0 {
            return Err(ActorError::InvalidInput("set_mass"));
        }
        let body = self.body_mut_or("set_mass")?;
        body.mass = mass;
        body.inv_mass = inv_or_zero(mass);
        Ok(())
    }

    /// Diagonal inertia tensor in the mass frame.
    pub fn mass_space_inertia(&self) -> Vec3 {
        self.body.as_ref().map_or(Vec3::ZERO, |b| b.inertia)
    }

    /// Sets the diagonal inertia tensor.
    pub fn set_mass_space_inertia(&mut self, inertia: Vec3) -> Result<(), ActorError> {
        if !inertia.is_finite() || inertia.min_element() < 0.0 {
            return Err(ActorError::InvalidInput("set_mass_space_inertia"));
        }
        let body = self.body_mut_or("set_mass_space_inertia")?;
        body.inertia = inertia;
        body.inv_inertia = inv_vec(inertia);
        Ok(())
    }

    /// Pose of the mass frame in actor space.
    pub fn center_of_mass_local_pose(&self) -> Pose {
        self.body
            .as_ref()
            .map_or(Pose::IDENTITY, |b| b.mass_local_pose)
    }

    /// Center of mass in actor space.
    pub fn center_of_mass_local_position(&self) -> Vec3 {
        self.center_of_mass_local_pose().translation
    }

    /// Pose of the mass frame in world space.
    pub fn center_of_mass_global_pose(&self) -> Pose {
        let Some(body) = &self.body else {
            return self.global_pose;
        };
        self.global_pose.then(&body.mass_local_pose)
    }

    /// Center of mass in world space.
    pub fn center_of_mass_global_position(&self) -> Vec3 {
        let Some(body) = &self.body else {
            return self.global_pose.translation;
        };
        self.global_pose.transform_point(body.mass_local_pose.translation)
    }

    /// Repositions the mass frame in actor space. The actor does not move.
    pub fn set_cmass_offset_local_pose(&mut self, pose: Pose) -> Result<(), ActorError> {
        if !pose.is_finite() {
            return Err(ActorError::InvalidInput("set_cmass_offset_local_pose"));
        }
        self.body_mut_or("set_cmass_offset_local_pose")?.mass_local_pose = pose;
        Ok(())
    }

    /// Repositions the center of mass in actor space.
    pub fn set_cmass_offset_local_position(&mut self, position: Vec3) -> Result<(), ActorError> {
        if !position.is_finite() {
            return Err(ActorError::InvalidInput("set_cmass_offset_local_position"));
        }
        self.body_mut_or("set_cmass_offset_local_position")?
            .mass_local_pose
            .translation = position;
        Ok(())
    }

    /// Reorients the mass frame in actor space.
    pub fn set_cmass_offset_local_orientation(
        &mut self,
        orientation: Quat,
    ) -> Result<(), ActorError> {
        if !orientation.is_finite() {
            return Err(ActorError::InvalidInput("set_cmass_offset_local_orientation"));
        }
        self.body_mut_or("set_cmass_offset_local_orientation")?
            .mass_local_pose
            .rotation = orientation;
        Ok(())
    }

    /// Repositions the mass frame so it lands at a world space pose. The
    /// actor does not move.
    pub fn set_cmass_offset_global_pose(&mut self, pose: Pose) -> Result<(), ActorError> {
        if !pose.is_finite() {
            return Err(ActorError::InvalidInput("set_cmass_offset_global_pose"));
        }
        let local = self.global_pose.inverse().then(&pose);
        self.body_mut_or("set_cmass_offset_global_pose")?.mass_local_pose = local;
        Ok(())
    }

    /// Repositions the center of mass to a world space point. The actor does
    /// not move.
    pub fn set_cmass_offset_global_position(&mut self, position: Vec3) -> Result<(), ActorError> {
        if !position.is_finite() {
            return Err(ActorError::InvalidInput("set_cmass_offset_global_position"));
        }
        let local = self.global_pose.inverse_transform_point(position);
        self.body_mut_or("set_cmass_offset_global_position")?
            .mass_local_pose
            .translation = local;
        Ok(())
    }

    /// Aligns the mass frame with a world space orientation. The actor does
    /// not move.
    pub fn set_cmass_offset_global_orientation(
        &mut self,
        orientation: Quat,
    ) -> Result<(), ActorError> {
        if !orientation.is_finite() {
            return Err(ActorError::InvalidInput("set_cmass_offset_global_orientation"));
        }
        let local = self.global_pose.rotation.inverse() * orientation;
        self.body_mut_or("set_cmass_offset_global_orientation")?
            .mass_local_pose
            .rotation = local;
        Ok(())
    }

    /// Moves the actor so its mass frame lands at the given world pose.
    /// Wakes the actor and leaves joint frames stale.
    pub fn set_cmass_global_pose(&mut self, pose: Pose) -> Result<(), ActorError> {
        if !pose.is_finite() {
            return Err(ActorError::InvalidInput("set_cmass_global_pose"));
        }
        let body = self.body_or("set_cmass_global_pose")?;
        self.global_pose = pose.then(&body.mass_local_pose.inverse());
        self.note_pose_change();
        Ok(())
    }

    /// Moves the actor so its center of mass lands at the given world point.
    pub fn set_cmass_global_position(&mut self, position: Vec3) -> Result<(), ActorError> {
        if !position.is_finite() {
            return Err(ActorError::InvalidInput("set_cmass_global_position"));
        }
        self.body_or("set_cmass_global_position")?;
        let com = self.center_of_mass_global_position();
        self.global_pose.translation += position - com;
        self.note_pose_change();
        Ok(())
    }

    /// Rotates the actor about its center of mass so the mass frame takes
    /// the given world orientation.
    pub fn set_cmass_global_orientation(&mut self, orientation: Quat) -> Result<(), ActorError> {
        if !orientation.is_finite() {
            return Err(ActorError::InvalidInput("set_cmass_global_orientation"));
        }
        let body = self.body_or("set_cmass_global_orientation")?;
        let com = self.global_pose.transform_point(body.mass_local_pose.translation);
        let rotation = orientation * body.mass_local_pose.rotation.inverse();
        let mass_translation = body.mass_local_pose.translation;
        self.global_pose.rotation = rotation;
        self.global_pose.translation = com - rotation * mass_translation;
        self.note_pose_change();
        Ok(())
    }

    /// The inertia tensor in world space (zero for static actors).
    pub fn global_inertia_tensor(&self) -> Mat3 {
        let Some(body) = &self.body else {
            return Mat3::ZERO;
        };
        let rot = Mat3::from_quat(self.global_pose.rotation * body.mass_local_pose.rotation);
        rot * Mat3::from_diagonal(body.inertia) * rot.transpose()
    }

    /// The inverse inertia tensor in world space (zero for static actors).
    pub fn global_inertia_tensor_inverse(&self) -> Mat3 {
        let Some(body) = &self.body else {
            return Mat3::ZERO;
        };
        let rot = Mat3::from_quat(self.global_pose.rotation * body.mass_local_pose.rotation);
        rot * Mat3::from_diagonal(body.inv_inertia) * rot.transpose()
    }

    /// Rederives mass, center of mass, and inertia from the attached shapes.
    ///
    /// Exactly one of `density` and `total_mass` must be nonzero: the former
    /// scales shape volumes, the latter fixes the total and uses the shapes
    /// only for the distribution. Pose and velocities are left untouched.
    pub fn update_mass_from_shapes(
        &mut self,
        density: f32,
        total_mass: f32,
    ) -> Result<(), ActorError> {
        if !density.is_finite() || density < 0.0 || !total_mass.is_finite() || total_mass < 0.0 {
            return Err(ActorError::InvalidInput("update_mass_from_shapes"));
        }
        if (density != 0.0) == (total_mass != 0.0) {
            return Err(ActorError::InvalidInput("update_mass_from_shapes"));
        }
        self.body_or("update_mass_from_shapes")?;
        let props = if density != 0.0 {
            MassProperties::from_shapes_density(&self.shapes, density)
        } else {
            MassProperties::from_shapes_total_mass(&self.shapes, total_mass)
        };
        self.body_mut_or("update_mass_from_shapes")?
            .apply_mass_properties(props);
        Ok(())
    }

    /// Kinetic energy `1/2 m v^2 + 1/2 w . I w` (zero for static actors).
    pub fn kinetic_energy(&self) -> f32 {
        let Some(body) = &self.body else {
            return 0.0;
        };
        let w = body.angular_velocity;
        0.5 * body.mass * body.linear_velocity.length_squared()
            + 0.5 * w.dot(body.inertia_world_mul(self.global_pose.rotation, w))
    }

    // ------------------------------------------------------------------
    // Forces and impulses
    // ------------------------------------------------------------------

    /// Applies a world space force or impulse through the center of mass.
    pub fn add_force(&mut self, force: Vec3, mode: ForceMode) -> Result<(), ActorError> {
        self.apply_force("add_force", force, None, mode)
    }

    /// Applies a force or impulse given in actor space.
    pub fn add_local_force(&mut self, force: Vec3, mode: ForceMode) -> Result<(), ActorError> {
        let world = self.global_pose.transform_vector(force);
        self.apply_force("add_local_force", world, None, mode)
    }

    /// Applies a world space force or impulse acting at a world space point.
    pub fn add_force_at_pos(
        &mut self,
        force: Vec3,
        pos: Vec3,
        mode: ForceMode,
    ) -> Result<(), ActorError> {
        self.apply_force("add_force_at_pos", force, Some(pos), mode)
    }

    /// Applies a world space force or impulse acting at an actor space point.
    pub fn add_force_at_local_pos(
        &mut self,
        force: Vec3,
        pos: Vec3,
        mode: ForceMode,
    ) -> Result<(), ActorError> {
        let point = self.global_pose.transform_point(pos);
        self.apply_force("add_force_at_local_pos", force, Some(point), mode)
    }

    /// Applies an actor space force or impulse acting at a world space point.
    pub fn add_local_force_at_pos(
        &mut self,
        force: Vec3,
        pos: Vec3,
        mode: ForceMode,
    ) -> Result<(), ActorError> {
        let world = self.global_pose.transform_vector(force);
        self.apply_force("add_local_force_at_pos", world, Some(pos), mode)
    }

    /// Applies an actor space force or impulse acting at an actor space
    /// point.
    pub fn add_local_force_at_local_pos(
        &mut self,
        force: Vec3,
        pos: Vec3,
        mode: ForceMode,
    ) -> Result<(), ActorError> {
        let world = self.global_pose.transform_vector(force);
        let point = self.global_pose.transform_point(pos);
        self.apply_force("add_local_force_at_local_pos", world, Some(point), mode)
    }

    /// Applies a world space torque or angular impulse.
    pub fn add_torque(&mut self, torque: Vec3, mode: ForceMode) -> Result<(), ActorError> {
        self.apply_torque("add_torque", torque, mode)
    }

    /// Applies a torque or angular impulse given in actor space.
    pub fn add_local_torque(&mut self, torque: Vec3, mode: ForceMode) -> Result<(), ActorError> {
        let world = self.global_pose.transform_vector(torque);
        self.apply_torque("add_local_torque", world, mode)
    }

    /// Force accumulated for the next step.
    pub fn pending_force(&self) -> Vec3 {
        self.body.as_ref().map_or(Vec3::ZERO, |b| b.accumulator.force)
    }

    /// Torque accumulated for the next step.
    pub fn pending_torque(&self) -> Vec3 {
        self.body
            .as_ref()
            .map_or(Vec3::ZERO, |b| b.accumulator.torque)
    }

    fn apply_force(
        &mut self,
        op: &'static str,
        force: Vec3,
        at_point: Option<Vec3>,
        mode: ForceMode,
    ) -> Result<(), ActorError> {
        if !force.is_finite() || at_point.is_some_and(|p| !p.is_finite()) {
            return Err(ActorError::InvalidInput(op));
        }
        if self.body.is_none() {
            return Err(ActorError::StaticActor(op));
        }
        if self.is_kinematic() {
            // Kinematic bodies silently ignore forces.
            return Ok(());
        }
        let com = self.center_of_mass_global_position();
        let rotation = self.global_pose.rotation;
        let Some(body) = self.body.as_mut() else {
            return Err(ActorError::StaticActor(op));
        };
        let offset = at_point.map(|p| p - com);
        match mode {
            ForceMode::Force => match offset {
                Some(r) => body.accumulator.add_force_at_offset(force, r),
                None => body.accumulator.add_force(force),
            },
            ForceMode::Impulse => {
                body.linear_velocity += force * body.inv_mass;
                if let Some(r) = offset {
                    let angular = r.cross(force);
                    body.angular_velocity += body.inv_inertia_world_mul(rotation, angular);
                }
            }
        }
        if force != Vec3::ZERO {
            body.sleep.wake(DEFAULT_WAKE_FRAMES);
        }
        Ok(())
    }

    fn apply_torque(
        &mut self,
        op: &'static str,
        torque: Vec3,
        mode: ForceMode,
    ) -> Result<(), ActorError> {
        if !torque.is_finite() {
            return Err(ActorError::InvalidInput(op));
        }
        if self.body.is_none() {
            return Err(ActorError::StaticActor(op));
        }
        if self.is_kinematic() {
            return Ok(());
        }
        let rotation = self.global_pose.rotation;
        let Some(body) = self.body.as_mut() else {
            return Err(ActorError::StaticActor(op));
        };
        match mode {
            ForceMode::Force => body.accumulator.add_torque(torque),
            ForceMode::Impulse => {
                body.angular_velocity += body.inv_inertia_world_mul(rotation, torque);
            }
        }
        if torque != Vec3::ZERO {
            body.sleep.wake(DEFAULT_WAKE_FRAMES);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sleep
    // ------------------------------------------------------------------

    /// True when the body is asleep. Static actors never sleep.
    pub fn is_sleeping(&self) -> bool {
        self.body
            .as_ref()
            .is_some_and(|b| b.sleep.state == SleepState::Asleep)
    }

    /// Linear sleep threshold override, if any.
    pub fn sleep_linear_velocity(&self) -> Option<f32> {
        self.body.as_ref().and_then(|b| b.sleep.linear_threshold)
    }

    /// Overrides the linear sleep threshold. A negative value drops the
    /// override and the scene default applies again.
    pub fn set_sleep_linear_velocity(&mut self, threshold: f32) -> Result<(), ActorError> {
        if threshold.is_nan() || threshold == f32::INFINITY {
            return Err(ActorError::InvalidInput("set_sleep_linear_velocity"));
        }
        let body = self.body_mut_or("set_sleep_linear_velocity")?;
        body.sleep.linear_threshold = if threshold < 0.0 { None } else { Some(threshold) };
        Ok(())
    }

    /// Angular sleep threshold override, if any.
    pub fn sleep_angular_velocity(&self) -> Option<f32> {
        self.body.as_ref().and_then(|b| b.sleep.angular_threshold)
    }

    /// Overrides the angular sleep threshold. A negative value drops the
    /// override and the scene default applies again.
    pub fn set_sleep_angular_velocity(&mut self, threshold: f32) -> Result<(), ActorError> {
        if threshold.is_nan() || threshold == f32::INFINITY {
            return Err(ActorError::InvalidInput("set_sleep_angular_velocity"));
        }
        let body = self.body_mut_or("set_sleep_angular_velocity")?;
        body.sleep.angular_threshold = if threshold < 0.0 { None } else { Some(threshold) };
        Ok(())
    }

    /// Wakes the actor for the default number of steps.
    pub fn wake_up(&mut self) -> Result<(), ActorError> {
        self.wake_up_for(DEFAULT_WAKE_FRAMES)
    }

    /// Wakes the actor and guarantees at least `frames` steps of
    /// wakefulness.
    pub fn wake_up_for(&mut self, frames: u32) -> Result<(), ActorError> {
        self.body_mut_or("wake_up")?.sleep.wake(frames);
        Ok(())
    }

    /// Puts the actor to sleep immediately, zeroing its velocities and
    /// dropping any pending forces.
    pub fn put_to_sleep(&mut self) -> Result<(), ActorError> {
        let body = self.body_mut_or("put_to_sleep")?;
        body.sleep.sleep();
        body.linear_velocity = Vec3::ZERO;
        body.angular_velocity = Vec3::ZERO;
        body.accumulator.clear();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Kinematic moves
    // ------------------------------------------------------------------

    /// Requests that a kinematic body reach `pose` by the end of the next
    /// step. The step derives matching velocities, so resting contact
    /// against the body behaves correctly. A later move in the same step
    /// overwrites the target.
    pub fn move_global_pose(&mut self, pose: Pose) -> Result<(), ActorError> {
        if !pose.is_finite() {
            return Err(ActorError::InvalidInput("move_global_pose"));
        }
        let body = self.body_mut_or("move_global_pose")?;
        body.kinematic_target = Some(pose);
        body.sleep.wake(DEFAULT_WAKE_FRAMES);
        Ok(())
    }

    /// Requests a kinematic move to `position`, keeping the pending target
    /// orientation (or the current one if no move is pending).
    pub fn move_global_position(&mut self, position: Vec3) -> Result<(), ActorError> {
        if !position.is_finite() {
            return Err(ActorError::InvalidInput("move_global_position"));
        }
        let current = self.global_pose;
        let body = self.body_mut_or("move_global_position")?;
        let rotation = body
            .kinematic_target
            .map_or(current.rotation, |t| t.rotation);
        body.kinematic_target = Some(Pose::new(position, rotation));
        body.sleep.wake(DEFAULT_WAKE_FRAMES);
        Ok(())
    }

    /// Requests a kinematic turn to `orientation`, keeping the pending
    /// target position (or the current one if no move is pending).
    pub fn move_global_orientation(&mut self, orientation: Quat) -> Result<(), ActorError> {
        if !orientation.is_finite() {
            return Err(ActorError::InvalidInput("move_global_orientation"));
        }
        let current = self.global_pose;
        let body = self.body_mut_or("move_global_orientation")?;
        let translation = body
            .kinematic_target
            .map_or(current.translation, |t| t.translation);
        body.kinematic_target = Some(Pose::new(translation, orientation));
        body.sleep.wake(DEFAULT_WAKE_FRAMES);
        Ok(())
    }

    /// The pending kinematic move target, if any.
    pub fn kinematic_target(&self) -> Option<Pose> {
        self.body.as_ref().and_then(|b| b.kinematic_target)
    }

    // ------------------------------------------------------------------
    // Shapes
    // ------------------------------------------------------------------

    /// Attaches a shape and returns its index.
    ///
    /// Mass properties are not rederived; call
    /// [`Actor::update_mass_from_shapes`] when the new shape should carry
    /// weight.
    pub fn create_shape(&mut self, shape: ShapeDesc) -> Result<usize, ActorError> {
        if !shape.is_valid() {
            return Err(ActorError::InvalidDescriptor("malformed shape"));
        }
        self.shapes.push(shape);
        Ok(self.shapes.len() - 1)
    }

    /// Detaches and returns the shape at `index`. Later shapes shift down.
    pub fn release_shape(&mut self, index: usize) -> Result<ShapeDesc, ActorError> {
        if index >= self.shapes.len() {
            return Err(ActorError::InvalidInput("release_shape"));
        }
        Ok(self.shapes.remove(index))
    }

    /// The attached shapes.
    pub fn shapes(&self) -> &[ShapeDesc] {
        &self.shapes
    }

    /// Number of attached shapes.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    // ------------------------------------------------------------------
    // Solver
    // ------------------------------------------------------------------

    /// Solver iterations requested by this body (zero for static actors).
    pub fn solver_iteration_count(&self) -> u32 {
        self.body
            .as_ref()
            .map_or(0, |b| b.solver_iteration_count)
    }

    /// Sets the solver iteration count. Must be at least one.
    pub fn set_solver_iteration_count(&mut self, count: u32) -> Result<(), ActorError> {
        if count == 0 {
            return Err(ActorError::InvalidInput("set_solver_iteration_count"));
        }
        self.body_mut_or("set_solver_iteration_count")?
            .solver_iteration_count = count;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------

    /// Captures the actor as a descriptor with current state.
    ///
    /// Mass properties come back as an explicit mass and tensor, never as a
    /// density. Shapes are not captured; read them off [`Actor::shapes`].
    pub fn save_to_desc(&self) -> ActorDesc {
        ActorDesc {
            global_pose: self.global_pose,
            body: self.body.as_ref().map(Body::to_desc),
            density: 0.0,
            shapes: Vec::new(),
            flags: self.flags,
            group: self.group,
            user_data: self.user_data,
            name: self.name.clone(),
        }
    }

    /// Captures the body state as a descriptor.
    pub fn save_body_to_desc(&self) -> Result<BodyDesc, ActorError> {
        Ok(self.body_or("save_body_to_desc")?.to_desc())
    }
}
