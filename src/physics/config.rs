//! Physics constants

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;

/// Per-tick physics constants
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Linear speed removed from each velocity component per tick
    pub drag: f32,
    /// Added to every body's velocity per tick
    pub gravity: Vec3,
    /// Angular speed removed from each angular velocity component per tick
    pub rotational_drag: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            drag: 0.001,
            gravity: Vec3::new(0.0, 0.0, -0.098),
            rotational_drag: 0.001,
        }
    }
}

impl PhysicsConfig {
    /// Drag-free, gravity-free constants
    pub fn frictionless() -> Self {
        Self {
            drag: 0.0,
            gravity: Vec3::ZERO,
            rotational_drag: 0.0,
        }
    }
}
