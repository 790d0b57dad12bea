//! Rigid body actor simulation.
//!
//! This crate provides the actor layer of a rigid body engine:
//!
//! - [`ActorDesc`] - Validated descriptor actors are built from
//! - [`Actor`] - Rigid body with pose, mass properties, forces, and sleep state
//! - [`MassProperties`] - Mass, center of mass, and principal inertia solver
//! - [`Scene`] - Simulation container stepping all actors on a fixed timestep

mod actor;
mod descriptor;
mod error;
mod forces;
mod mass;
mod pose;
mod scene;
mod shape;
mod sleep;

pub use actor::Actor;
pub use descriptor::{ActorDesc, ActorFlags, BodyDesc};
pub use error::ActorError;
pub use forces::{ForceAccumulator, ForceMode};
pub use glam;
pub use mass::{MassProperties, diagonalize_inertia};
pub use pose::Pose;
pub use scene::{Scene, SimulationConfig};
pub use shape::{ShapeDesc, ShapeGeometry};
pub use sleep::{DEFAULT_WAKE_FRAMES, SleepState};
