//! Actor/collider overlap detection
//!
//! Two cadences: a [`ProximityPruner`] rebuilds the coarse [`ProximityMap`] in
//! the background, and [`CollisionWorld::update`] runs the exact check once
//! per frame over the pairs in the latest map only.

pub mod entity;
pub mod report;
pub mod mesh;
pub mod proximity;
pub mod world;

pub use entity::{Bounds, CollisionEntity, EntityId, PositionSource, Role};
pub use report::CollisionReport;
pub use mesh::{MeshError, TriangleMesh};
pub use proximity::{EntityPosition, PositionSnapshot, ProximityIndex, ProximityMap, ProximityPruner};
pub use world::CollisionWorld;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Collision detection tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Pairs farther apart than this are left out of the proximity map
    pub proximity_threshold: f32,
    /// Pairs farther apart than this are never reported, whatever their radii
    pub outer_cutoff: f32,
    /// Background proximity rebuild interval
    pub refresh_interval_ms: u64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 80.0,
            outer_cutoff: 75.0,
            refresh_interval_ms: 50,
        }
    }
}

impl CollisionConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }
}
