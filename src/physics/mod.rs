//! Rigid-body integration and boundary-plane collision response

pub mod config;
pub mod body;
pub mod plane;
pub mod resolver;
pub mod integrator;

pub use config::PhysicsConfig;
pub use body::{BodyHandle, BodyRef, RigidBody};
pub use plane::{Axis, BoundaryPlane, Orientation, Polarity, Response};
pub use resolver::{BodyCollision, BoundaryCollisionResolver};
pub use integrator::{CollisionAction, RigidBodyIntegrator};

use thiserror::Error;

/// Errors raised by physics registration and force application.
///
/// These indicate integration bugs (bad vector shape, bad plane
/// configuration) and are surfaced at the call that caused them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("vector has {got} components, body vectors have {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("unknown plane orientation '{0}' (expected +x, -x, +y, -y, +z or -z)")]
    UnknownOrientation(String),

    #[error("unknown collision response '{0}' (expected rebound, damp, stop or magnetic)")]
    UnknownResponse(String),

    #[error("unknown magnetic polarity '{0}' (expected + or -)")]
    UnknownPolarity(String),
}
