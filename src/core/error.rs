//! Error types for the slipstream core

use thiserror::Error;

use crate::collision::mesh::MeshError;
use crate::generation::weighted::SamplerError;
use crate::physics::PhysicsError;
use crate::snapshot::SnapshotError;

/// Main error type for the simulation core
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("Sampler error: {0}")]
    Sampler(#[from] SamplerError),

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Network error: {0}")]
    Net(#[from] slipstream_net::NetError),
}
