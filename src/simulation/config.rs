//! Top-level simulation configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::collision::CollisionConfig;
use crate::core::{Error, Result, Vec3};
use crate::generation::GenerationConfig;
use crate::physics::PhysicsConfig;
use crate::streaming::StreamingConfig;

/// Static boundary plane set up when the simulation starts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneConfig {
    pub name: String,
    /// Plane position along its axis
    pub position: f32,
    /// One of `+x`, `-x`, `+y`, `-y`, `+z`, `-z`
    pub orientation: String,
    /// One of `rebound`, `damp`, `stop`, `magnetic`
    pub response: String,
    #[serde(default)]
    pub magnetic_strength: f32,
    #[serde(default = "default_polarity")]
    pub magnetic_polarity: String,
}

fn default_polarity() -> String {
    "+".into()
}

/// Everything the server needs to run a simulation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub generation: GenerationConfig,
    pub streaming: StreamingConfig,
    pub physics: PhysicsConfig,
    pub collision: CollisionConfig,
    pub planes: Vec<PlaneConfig>,
    /// Per-axis ship speed above which thrust stops accumulating
    pub ship_velocity_cap: Option<Vec3>,
    pub ship_angular_cap: Option<Vec3>,
    /// Physics ticks per second
    pub tick_rate_hz: f32,
    /// Streaming window updates per second
    pub terrain_rate_hz: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            streaming: StreamingConfig::default(),
            physics: PhysicsConfig::default(),
            collision: CollisionConfig::default(),
            planes: Vec::new(),
            ship_velocity_cap: None,
            ship_angular_cap: None,
            tick_rate_hz: 60.0,
            terrain_rate_hz: 20.0,
        }
    }
}

impl SimulationConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let rate_ok = |r: f32| r.is_finite() && r > 0.0;
        if !rate_ok(self.tick_rate_hz) {
            return Err(Error::Config(format!("tick_rate_hz must be positive, got {}", self.tick_rate_hz)));
        }
        if !rate_ok(self.terrain_rate_hz) {
            return Err(Error::Config(format!("terrain_rate_hz must be positive, got {}", self.terrain_rate_hz)));
        }
        if self.collision.proximity_threshold < self.collision.outer_cutoff {
            return Err(Error::Config(format!(
                "proximity_threshold ({}) must not be below outer_cutoff ({})",
                self.collision.proximity_threshold, self.collision.outer_cutoff
            )));
        }
        if !(0.0..1.0).contains(&self.generation.threshold) {
            return Err(Error::Config(format!(
                "generation threshold must be in [0, 1), got {}",
                self.generation.threshold
            )));
        }
        Ok(())
    }
}
