//! Scene: actor storage and the simulation step.
//!
//! Actors live in slots addressed by `usize` ids; released slots are reused.
//! Each step applies gravity, integrates velocities and poses, runs the
//! island sleep pass, and clears the force accumulators.

use std::collections::HashMap;

use glam::{Quat, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::descriptor::{ActorDesc, ActorFlags};
use crate::error::ActorError;
use crate::sleep::{IslandMap, SleepState};

// ============================================================================
// Configuration
// ============================================================================

/// Scene-wide integration and sleep parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Gravity applied to dynamic actors.
    pub gravity: Vec3,
    /// Fixed timestep in seconds.
    pub timestep: f32,
    /// Default linear speed below which actors may fall asleep.
    pub sleep_linear_velocity: f32,
    /// Default angular speed below which actors may fall asleep.
    pub sleep_angular_velocity: f32,
    /// Quiet steps required before an island sleeps.
    pub sleep_frames: u32,
    /// Default cap on angular speed.
    pub max_angular_velocity: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            timestep: 1.0 / 60.0,
            sleep_linear_velocity: 0.15,
            sleep_angular_velocity: 0.14,
            sleep_frames: 20,
            max_angular_velocity: 7.0,
        }
    }
}

// ============================================================================
// Scene
// ============================================================================

/// Owns the actors and advances the simulation.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scene {
    slots: Vec<Option<Actor>>,
    free: Vec<usize>,
    connections: Vec<(usize, usize)>,
    /// Simulation parameters, adjustable between steps.
    pub config: SimulationConfig,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            connections: Vec::new(),
            config,
        }
    }

    /// Validates the descriptor and creates an actor, returning its slot id.
    ///
    /// The descriptor is copied; the caller keeps it and may reuse it.
    pub fn create_actor(&mut self, desc: &ActorDesc) -> Result<usize, ActorError> {
        let actor = Actor::from_desc(desc)?;
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(actor);
                id
            }
            None => {
                self.slots.push(Some(actor));
                self.slots.len() - 1
            }
        };
        Ok(id)
    }

    /// Removes an actor, returning whether the slot was alive. Its slot will
    /// be reused and its connections are dropped. Releasing a dead or unknown
    /// id does nothing and returns `false`.
    pub fn release_actor(&mut self, id: usize) -> bool {
        let Some(slot) = self.slots.get_mut(id) else {
            return false;
        };
        if slot.take().is_none() {
            return false;
        }
        self.free.push(id);
        self.connections.retain(|&(a, b)| a != id && b != id);
        true
    }

    /// The actor in slot `id`, if alive.
    pub fn actor(&self, id: usize) -> Option<&Actor> {
        self.slots.get(id).and_then(|slot| slot.as_ref())
    }

    /// Mutable access to the actor in slot `id`, if alive.
    pub fn actor_mut(&mut self, id: usize) -> Option<&mut Actor> {
        self.slots.get_mut(id).and_then(|slot| slot.as_mut())
    }

    /// Number of live actors.
    pub fn actor_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterates live actors with their slot ids.
    pub fn actors(&self) -> impl Iterator<Item = (usize, &Actor)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|actor| (id, actor)))
    }

    /// Declares which actor pairs are coupled (by joints or persistent
    /// contact). Coupled actors sleep and wake as one island. Pairs naming
    /// static or dead actors are ignored.
    pub fn set_connections(&mut self, connections: Vec<(usize, usize)>) {
        self.connections = connections;
    }

    /// True when the actor and every dynamic actor in its island are asleep.
    ///
    /// An awake actor keeps its whole island awake, but one asleep actor
    /// says nothing about the rest, so this can be false for an actor whose
    /// own `is_sleeping` is true.
    pub fn is_group_sleeping(&self, id: usize) -> bool {
        let Some(actor) = self.actor(id) else {
            return false;
        };
        if !actor.is_dynamic() || !actor.is_sleeping() {
            return false;
        }
        let mut islands = self.build_islands();
        let root = islands.find(id);
        for other in 0..self.slots.len() {
            let Some(candidate) = self.actor(other) else {
                continue;
            };
            if candidate.is_dynamic() && islands.find(other) == root && !candidate.is_sleeping() {
                return false;
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Advances the simulation by one fixed timestep.
    pub fn step(&mut self) {
        let dt = self.config.timestep;
        self.apply_gravity();
        self.integrate_velocities(dt);
        self.integrate_positions(dt);
        self.update_sleep();
        self.finish_step();
    }

    fn apply_gravity(&mut self) {
        let gravity = self.config.gravity;
        for slot in &mut self.slots {
            let Some(actor) = slot else { continue };
            if actor.is_kinematic()
                || actor.read_flag(ActorFlags::FROZEN)
                || actor.read_flag(ActorFlags::DISABLE_GRAVITY)
            {
                continue;
            }
            let Some(body) = actor.body.as_mut() else {
                continue;
            };
            if body.sleep.state == SleepState::Asleep || body.mass == 0.0 {
                continue;
            }
            body.accumulator.add_force(gravity * body.mass);
        }
    }

    fn integrate_velocities(&mut self, dt: f32) {
        let default_cap = self.config.max_angular_velocity;
        for slot in &mut self.slots {
            let Some(actor) = slot else { continue };
            if actor.is_kinematic() || actor.read_flag(ActorFlags::FROZEN) {
                continue;
            }
            let rotation = actor.global_pose.rotation;
            let Some(body) = actor.body.as_mut() else {
                continue;
            };
            if body.sleep.state == SleepState::Asleep {
                continue;
            }

            body.linear_velocity += body.accumulator.force * body.inv_mass * dt;
            let torque = body.accumulator.torque;
            body.angular_velocity += body.inv_inertia_world_mul(rotation, torque) * dt;

            body.linear_velocity *= (1.0 - body.linear_damping * dt).max(0.0);
            body.angular_velocity *= (1.0 - body.angular_damping * dt).max(0.0);

            let cap = body.max_angular_velocity.unwrap_or(default_cap);
            let speed = body.angular_velocity.length();
            if speed > cap {
                body.angular_velocity *= cap / speed;
            }
        }
    }

    fn integrate_positions(&mut self, dt: f32) {
        for slot in &mut self.slots {
            let Some(actor) = slot else { continue };
            if actor.read_flag(ActorFlags::FROZEN) {
                continue;
            }
            let kinematic = actor.is_kinematic();
            let pose = actor.global_pose;
            let Some(body) = actor.body.as_mut() else {
                continue;
            };
            if body.sleep.state == SleepState::Asleep {
                continue;
            }

            if kinematic {
                // Kinematic bodies jump to their target and report the
                // velocities that move would have had.
                let Some(target) = body.kinematic_target else {
                    continue;
                };
                body.linear_velocity = (target.translation - pose.translation) / dt;
                let delta = target.rotation * pose.rotation.inverse();
                let (axis, angle) = delta.to_axis_angle();
                body.angular_velocity = axis * (angle / dt);
                actor.global_pose = target;
            } else {
                // Integrate the center of mass, then place the actor origin
                // back behind it.
                let local_com = body.mass_local_pose.translation;
                let com = pose.transform_point(local_com) + body.linear_velocity * dt;
                let w = body.angular_velocity;
                let q = pose.rotation;
                let dq = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * q * 0.5 * dt;
                let q = (q + dq).normalize();
                actor.global_pose.rotation = q;
                actor.global_pose.translation = com - q * local_com;
            }
        }
    }

    fn update_sleep(&mut self) {
        let default_linear = self.config.sleep_linear_velocity;
        let default_angular = self.config.sleep_angular_velocity;
        let reset_frames = self.config.sleep_frames;

        // Count quiet frames down per body.
        for slot in &mut self.slots {
            let Some(actor) = slot else { continue };
            let Some(body) = actor.body.as_mut() else {
                continue;
            };
            if body.sleep.state == SleepState::Asleep {
                continue;
            }
            let linear = body.sleep.linear_threshold.unwrap_or(default_linear);
            let angular = body.sleep.angular_threshold.unwrap_or(default_angular);
            if body.linear_velocity.length() <= linear
                && body.angular_velocity.length() <= angular
            {
                body.sleep.wake_frames = body.sleep.wake_frames.saturating_sub(1);
            } else {
                body.sleep.wake_frames = reset_frames;
            }
        }

        // Islands sleep and wake as a unit: one lively member keeps the
        // whole island up, and island-wide quiet puts everyone down.
        let mut islands = self.build_islands();
        let mut island_active: HashMap<usize, bool> = HashMap::new();
        for id in 0..self.slots.len() {
            let Some(actor) = self.actor(id) else { continue };
            let Some(body) = &actor.body else { continue };
            let root = islands.find(id);
            let active = island_active.entry(root).or_insert(false);
            if body.sleep.state == SleepState::Awake && body.sleep.wake_frames > 0 {
                *active = true;
            }
        }

        for id in 0..self.slots.len() {
            let root = islands.find(id);
            let Some(slot) = self.slots.get_mut(id) else {
                continue;
            };
            let Some(actor) = slot else { continue };
            let Some(body) = actor.body.as_mut() else {
                continue;
            };
            let active = island_active.get(&root).copied().unwrap_or(false);
            if active {
                if body.sleep.state == SleepState::Asleep {
                    body.sleep.wake(reset_frames);
                }
            } else if body.sleep.state == SleepState::Awake {
                body.sleep.sleep();
                body.linear_velocity = Vec3::ZERO;
                body.angular_velocity = Vec3::ZERO;
            }
        }
    }

    fn finish_step(&mut self) {
        for slot in &mut self.slots {
            let Some(actor) = slot else { continue };
            let kinematic = actor.is_kinematic();
            let Some(body) = actor.body.as_mut() else {
                continue;
            };
            body.kinematic_target = None;
            if kinematic {
                body.linear_velocity = Vec3::ZERO;
                body.angular_velocity = Vec3::ZERO;
            }
            body.accumulator.clear();
        }
    }

    fn build_islands(&self) -> IslandMap {
        let mut islands = IslandMap::new(self.slots.len());
        for &(a, b) in &self.connections {
            // Static actors never join an island, so chains through them
            // do not couple their neighbors.
            if self.is_dynamic_slot(a) && self.is_dynamic_slot(b) {
                islands.union(a, b);
            }
        }
        islands
    }

    fn is_dynamic_slot(&self, id: usize) -> bool {
        matches!(self.actor(id), Some(actor) if actor.is_dynamic())
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::BodyDesc;
    use crate::forces::ForceMode;
    use crate::pose::Pose;
    use crate::shape::{ShapeDesc, ShapeGeometry};

    fn no_gravity() -> SimulationConfig {
        SimulationConfig {
            gravity: Vec3::ZERO,
            ..SimulationConfig::default()
        }
    }

    fn ball_desc(at: Vec3) -> ActorDesc {
        ActorDesc::new(Pose::from_translation(at))
            .with_body(BodyDesc::default())
            .with_density(1000.0)
            .with_shape(ShapeDesc::new(ShapeGeometry::sphere(0.5)))
    }

    fn point_desc(at: Vec3) -> ActorDesc {
        ActorDesc::new(Pose::from_translation(at)).with_body(
            BodyDesc::default()
                .with_mass(2.0)
                .with_mass_space_inertia(Vec3::splat(2.0))
                .with_angular_damping(0.0),
        )
    }

    #[test]
    fn test_gravity_accelerates_fall() {
        let mut scene = Scene::default();
        let id = scene
            .create_actor(&ball_desc(Vec3::new(0.0, 5.0, 0.0)))
            .unwrap();
        for _ in 0..60 {
            scene.step();
        }
        let actor = scene.actor(id).unwrap();
        assert!(actor.global_position().y < 5.0, "y = {}", actor.global_position().y);
        // After one second of free fall the speed is close to g.
        assert!(actor.linear_velocity().y < -9.0, "v = {:?}", actor.linear_velocity());
    }

    #[test]
    fn test_static_actor_never_moves() {
        let mut scene = Scene::default();
        let id = scene
            .create_actor(
                &ActorDesc::new(Pose::from_translation(Vec3::Y))
                    .with_shape(ShapeDesc::new(ShapeGeometry::box_shape(Vec3::ONE))),
            )
            .unwrap();
        for _ in 0..10 {
            scene.step();
        }
        let actor = scene.actor(id).unwrap();
        assert_eq!(actor.global_position(), Vec3::Y);
        assert!(!actor.is_dynamic());
    }

    #[test]
    fn test_force_integrates_over_one_step() {
        let mut scene = Scene::new(no_gravity());
        let id = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        let dt = scene.config.timestep;
        scene
            .actor_mut(id)
            .unwrap()
            .add_force(Vec3::new(2.0, 0.0, 0.0), ForceMode::Force)
            .unwrap();
        scene.step();
        let v = scene.actor(id).unwrap().linear_velocity();
        assert!((v.x - dt).abs() < 1e-5, "v = {:?}", v);

        // The accumulator was cleared, so a second step adds nothing.
        scene.step();
        let v2 = scene.actor(id).unwrap().linear_velocity();
        assert!((v2.x - v.x).abs() < 1e-6);
        assert_eq!(scene.actor(id).unwrap().pending_force(), Vec3::ZERO);
    }

    #[test]
    fn test_damping_decays_velocity() {
        let mut scene = Scene::new(no_gravity());
        let desc = ActorDesc::new(Pose::IDENTITY).with_body(
            BodyDesc::default()
                .with_mass(1.0)
                .with_linear_damping(0.5)
                .with_linear_velocity(Vec3::new(1.0, 0.0, 0.0)),
        );
        let id = scene.create_actor(&desc).unwrap();
        let dt = scene.config.timestep;
        scene.step();
        let v = scene.actor(id).unwrap().linear_velocity();
        let expected = 1.0 - 0.5 * dt;
        assert!((v.x - expected).abs() < 1e-5, "v = {:?}", v);
    }

    #[test]
    fn test_angular_velocity_clamped() {
        let mut scene = Scene::new(no_gravity());
        let desc = ActorDesc::new(Pose::IDENTITY).with_body(
            BodyDesc::default()
                .with_mass(1.0)
                .with_mass_space_inertia(Vec3::ONE)
                .with_angular_damping(0.0)
                .with_angular_velocity(Vec3::new(100.0, 0.0, 0.0)),
        );
        let id = scene.create_actor(&desc).unwrap();
        scene.step();
        let w = scene.actor(id).unwrap().angular_velocity();
        assert!(
            (w.length() - scene.config.max_angular_velocity).abs() < 1e-3,
            "w = {:?}",
            w
        );

        // A per-actor cap overrides the scene default.
        scene.actor_mut(id).unwrap().set_max_angular_velocity(3.0).unwrap();
        scene.actor_mut(id).unwrap().set_angular_velocity(Vec3::new(100.0, 0.0, 0.0)).unwrap();
        scene.step();
        let w = scene.actor(id).unwrap().angular_velocity();
        assert!((w.length() - 3.0).abs() < 1e-3, "w = {:?}", w);
    }

    #[test]
    fn test_position_integration() {
        let mut scene = Scene::new(no_gravity());
        let desc = ActorDesc::new(Pose::IDENTITY).with_body(
            BodyDesc::default()
                .with_mass(1.0)
                .with_linear_velocity(Vec3::new(1.0, 0.0, 0.0)),
        );
        let id = scene.create_actor(&desc).unwrap();
        let dt = scene.config.timestep;
        scene.step();
        let p = scene.actor(id).unwrap().global_position();
        assert!((p.x - dt).abs() < 1e-5, "p = {:?}", p);
    }

    #[test]
    fn test_rotation_integration() {
        let mut scene = Scene::new(no_gravity());
        let spin = std::f32::consts::PI;
        let desc = ActorDesc::new(Pose::IDENTITY).with_body(
            BodyDesc::default()
                .with_mass(1.0)
                .with_mass_space_inertia(Vec3::ONE)
                .with_angular_damping(0.0)
                .with_angular_velocity(Vec3::new(0.0, 0.0, spin)),
        );
        let id = scene.create_actor(&desc).unwrap();
        let dt = scene.config.timestep;
        scene.step();
        let (axis, angle) = scene.actor(id).unwrap().global_orientation().to_axis_angle();
        assert!((angle - spin * dt).abs() < 2e-3, "angle = {}", angle);
        assert!(axis.z > 0.99, "axis = {:?}", axis);
    }

    #[test]
    fn test_offset_center_of_mass_orbits_origin() {
        let mut scene = Scene::new(no_gravity());
        let desc = ActorDesc::new(Pose::IDENTITY).with_body(
            BodyDesc::default()
                .with_mass(1.0)
                .with_mass_space_inertia(Vec3::ONE)
                .with_mass_local_pose(Pose::from_translation(Vec3::new(1.0, 0.0, 0.0)))
                .with_angular_damping(0.0)
                .with_angular_velocity(Vec3::new(0.0, 0.0, 1.0)),
        );
        let id = scene.create_actor(&desc).unwrap();
        let com_before = scene.actor(id).unwrap().center_of_mass_global_position();
        scene.step();
        let actor = scene.actor(id).unwrap();
        // The center of mass holds still while the origin swings around it.
        let com_after = actor.center_of_mass_global_position();
        assert!((com_after - com_before).length() < 1e-4, "com = {:?}", com_after);
        assert!(actor.global_position().y < 0.0, "origin = {:?}", actor.global_position());
    }

    #[test]
    fn test_kinematic_move_executes_during_step() {
        let mut scene = Scene::new(no_gravity());
        let desc = point_desc(Vec3::ZERO).with_flags(ActorFlags::KINEMATIC);
        let id = scene.create_actor(&desc).unwrap();
        let target = Pose::from_translation(Vec3::new(1.0, 2.0, 3.0));
        scene.actor_mut(id).unwrap().move_global_pose(target).unwrap();
        scene.step();
        let actor = scene.actor(id).unwrap();
        assert_eq!(actor.global_pose(), target);
        // The move velocities are transient; they read zero between steps.
        assert_eq!(actor.linear_velocity(), Vec3::ZERO);
        assert_eq!(actor.kinematic_target(), None);
    }

    #[test]
    fn test_kinematic_without_target_holds_pose() {
        let mut scene = Scene::default();
        let desc = point_desc(Vec3::new(0.0, 3.0, 0.0)).with_flags(ActorFlags::KINEMATIC);
        let id = scene.create_actor(&desc).unwrap();
        for _ in 0..10 {
            scene.step();
        }
        // Gravity does not pull kinematic bodies down.
        assert_eq!(
            scene.actor(id).unwrap().global_position(),
            Vec3::new(0.0, 3.0, 0.0)
        );
    }

    #[test]
    fn test_move_target_cleared_for_dynamic_actor() {
        let mut scene = Scene::new(no_gravity());
        let id = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        scene
            .actor_mut(id)
            .unwrap()
            .move_global_position(Vec3::new(5.0, 0.0, 0.0))
            .unwrap();
        scene.step();
        let actor = scene.actor(id).unwrap();
        // Targets only steer kinematic bodies; a plain dynamic actor stays
        // put and the stale target is dropped.
        assert_eq!(actor.kinematic_target(), None);
        assert!(actor.global_position().length() < 1e-5);
    }

    #[test]
    fn test_frozen_actor_holds_state() {
        let mut scene = Scene::default();
        let desc = point_desc(Vec3::new(0.0, 2.0, 0.0)).with_flags(ActorFlags::FROZEN);
        let id = scene.create_actor(&desc).unwrap();
        scene.actor_mut(id).unwrap().set_linear_velocity(Vec3::X).unwrap();
        for _ in 0..5 {
            scene.step();
        }
        let actor = scene.actor(id).unwrap();
        assert_eq!(actor.global_position(), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(actor.linear_velocity(), Vec3::X);
    }

    #[test]
    fn test_disable_gravity_flag() {
        let mut scene = Scene::default();
        let desc = point_desc(Vec3::ZERO).with_flags(ActorFlags::DISABLE_GRAVITY);
        let id = scene.create_actor(&desc).unwrap();
        scene.step();
        assert_eq!(scene.actor(id).unwrap().linear_velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_quiet_actor_sleeps_after_counted_frames() {
        let mut scene = Scene::new(no_gravity());
        let id = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        scene
            .actor_mut(id)
            .unwrap()
            .set_linear_velocity(Vec3::new(0.01, 0.0, 0.0))
            .unwrap();
        // Wake counter and sleep frames are both 20: awake through step 19,
        // asleep at step 20.
        for _ in 0..19 {
            scene.step();
        }
        assert!(!scene.actor(id).unwrap().is_sleeping());
        scene.step();
        let actor = scene.actor(id).unwrap();
        assert!(actor.is_sleeping());
        assert_eq!(actor.linear_velocity(), Vec3::ZERO);

        // A sleeping actor stops integrating entirely.
        let pose = scene.actor(id).unwrap().global_pose();
        for _ in 0..5 {
            scene.step();
        }
        assert_eq!(scene.actor(id).unwrap().global_pose(), pose);
    }

    #[test]
    fn test_fast_actor_stays_awake() {
        let mut scene = Scene::new(no_gravity());
        let desc = ActorDesc::new(Pose::IDENTITY).with_body(
            BodyDesc::default()
                .with_mass(1.0)
                .with_linear_velocity(Vec3::new(1.0, 0.0, 0.0)),
        );
        let id = scene.create_actor(&desc).unwrap();
        for _ in 0..40 {
            scene.step();
        }
        assert!(!scene.actor(id).unwrap().is_sleeping());
    }

    #[test]
    fn test_sleep_threshold_override() {
        let mut scene = Scene::new(no_gravity());
        // Moving at 1.0 but with a generous per-actor threshold of 10.
        let desc = ActorDesc::new(Pose::IDENTITY).with_body(
            BodyDesc::default()
                .with_mass(1.0)
                .with_linear_velocity(Vec3::new(1.0, 0.0, 0.0))
                .with_sleep_linear_velocity(10.0),
        );
        let id = scene.create_actor(&desc).unwrap();
        for _ in 0..21 {
            scene.step();
        }
        assert!(scene.actor(id).unwrap().is_sleeping());
    }

    #[test]
    fn test_wake_up_for_guarantees_frames() {
        let mut scene = Scene::new(no_gravity());
        let id = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        for _ in 0..21 {
            scene.step();
        }
        assert!(scene.actor(id).unwrap().is_sleeping());

        scene.actor_mut(id).unwrap().wake_up_for(5).unwrap();
        for _ in 0..4 {
            scene.step();
            assert!(!scene.actor(id).unwrap().is_sleeping());
        }
        scene.step();
        assert!(scene.actor(id).unwrap().is_sleeping());
    }

    #[test]
    fn test_lively_member_keeps_island_awake() {
        let mut scene = Scene::new(no_gravity());
        let quiet = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        let lively_desc = ActorDesc::new(Pose::from_translation(Vec3::X * 3.0)).with_body(
            BodyDesc::default()
                .with_mass(1.0)
                .with_linear_velocity(Vec3::new(1.0, 0.0, 0.0)),
        );
        let lively = scene.create_actor(&lively_desc).unwrap();
        scene.set_connections(vec![(quiet, lively)]);
        for _ in 0..40 {
            scene.step();
        }
        // Alone the quiet one would be asleep by now.
        assert!(!scene.actor(quiet).unwrap().is_sleeping());
        assert!(!scene.actor(lively).unwrap().is_sleeping());
        assert!(!scene.is_group_sleeping(quiet));
    }

    #[test]
    fn test_island_sleeps_together() {
        let mut scene = Scene::new(no_gravity());
        let a = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        let b = scene.create_actor(&point_desc(Vec3::X * 3.0)).unwrap();
        scene.set_connections(vec![(a, b)]);
        for _ in 0..25 {
            scene.step();
        }
        assert!(scene.actor(a).unwrap().is_sleeping());
        assert!(scene.actor(b).unwrap().is_sleeping());
        assert!(scene.is_group_sleeping(a));
        assert!(scene.is_group_sleeping(b));
    }

    #[test]
    fn test_waking_one_wakes_island() {
        let mut scene = Scene::new(no_gravity());
        let a = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        let b = scene.create_actor(&point_desc(Vec3::X * 3.0)).unwrap();
        scene.set_connections(vec![(a, b)]);
        for _ in 0..25 {
            scene.step();
        }
        assert!(scene.is_group_sleeping(b));

        scene.actor_mut(a).unwrap().wake_up().unwrap();
        // An asleep member does not make the group asleep once a neighbor
        // is up again.
        assert!(scene.actor(b).unwrap().is_sleeping());
        assert!(!scene.is_group_sleeping(b));
        scene.step();
        assert!(!scene.actor(b).unwrap().is_sleeping());
    }

    #[test]
    fn test_static_connection_does_not_couple() {
        let mut scene = Scene::new(no_gravity());
        let quiet = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        let anchor = scene
            .create_actor(&ActorDesc::new(Pose::IDENTITY).with_shape(ShapeDesc::new(
                ShapeGeometry::box_shape(Vec3::ONE),
            )))
            .unwrap();
        let lively_desc = ActorDesc::new(Pose::from_translation(Vec3::X * 5.0)).with_body(
            BodyDesc::default()
                .with_mass(1.0)
                .with_linear_velocity(Vec3::new(1.0, 0.0, 0.0)),
        );
        let lively = scene.create_actor(&lively_desc).unwrap();
        // Chained through a static anchor: no coupling results.
        scene.set_connections(vec![(quiet, anchor), (anchor, lively)]);
        for _ in 0..25 {
            scene.step();
        }
        assert!(scene.actor(quiet).unwrap().is_sleeping());
        assert!(!scene.actor(lively).unwrap().is_sleeping());
        assert!(scene.is_group_sleeping(quiet));
    }

    #[test]
    fn test_release_and_slot_reuse() {
        let mut scene = Scene::new(no_gravity());
        let a = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        let b = scene.create_actor(&point_desc(Vec3::X)).unwrap();
        scene.set_connections(vec![(a, b)]);
        assert_eq!(scene.actor_count(), 2);

        assert!(scene.release_actor(a));
        assert_eq!(scene.actor_count(), 1);
        assert!(scene.actor(a).is_none());

        // Releasing twice is a no-op.
        assert!(!scene.release_actor(a));
        assert_eq!(scene.actor_count(), 1);

        // The freed slot is handed out again.
        let mut desc = point_desc(Vec3::Y);
        desc.user_data = 42;
        let c = scene.create_actor(&desc).unwrap();
        assert_eq!(c, a);
        assert_eq!(scene.actor(c).unwrap().user_data, 42);

        // The stale connection was dropped with the release, so the new
        // occupant sleeps on its own schedule.
        for _ in 0..25 {
            scene.step();
        }
        assert!(scene.actor(c).unwrap().is_sleeping());
        assert!(scene.is_group_sleeping(c));
    }

    #[test]
    fn test_actors_iterator() {
        let mut scene = Scene::new(no_gravity());
        let a = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        let b = scene.create_actor(&point_desc(Vec3::X)).unwrap();
        scene.release_actor(a);
        let ids: Vec<usize> = scene.actors().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![b]);
    }

    #[test]
    fn test_sleeping_actor_receiving_impulse_wakes_and_moves() {
        let mut scene = Scene::new(no_gravity());
        let id = scene.create_actor(&point_desc(Vec3::ZERO)).unwrap();
        for _ in 0..21 {
            scene.step();
        }
        assert!(scene.actor(id).unwrap().is_sleeping());

        scene
            .actor_mut(id)
            .unwrap()
            .add_force(Vec3::new(2.0, 0.0, 0.0), ForceMode::Impulse)
            .unwrap();
        assert!(!scene.actor(id).unwrap().is_sleeping());
        scene.step();
        assert!(scene.actor(id).unwrap().global_position().x > 0.0);
    }
}
