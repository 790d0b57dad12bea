//! Error types for actor creation and mutation.

use thiserror::Error;

/// Errors returned by actor construction and the per-actor operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActorError {
    /// A descriptor failed validation and no actor was created.
    #[error("invalid actor descriptor: {0}")]
    InvalidDescriptor(&'static str),
    /// A dynamics-only operation was called on a static actor.
    #[error("{0} requires a dynamic actor")]
    StaticActor(&'static str),
    /// An argument was out of range or not finite.
    #[error("invalid input to {0}")]
    InvalidInput(&'static str),
}
