//! Generation configuration

use serde::{Deserialize, Serialize};

/// Relative frequency and size of one kind of generated object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectWeight {
    /// Object kind, sent to clients as the object `id`
    pub kind: String,
    /// Relative frequency (non-negative)
    pub weight: f64,
    /// Edge length of the generated object in world units
    #[serde(default = "default_object_size")]
    pub size: f32,
}

fn default_object_size() -> f32 {
    1.0
}

impl ObjectWeight {
    pub fn new(kind: impl Into<String>, weight: f64, size: f32) -> Self {
        Self { kind: kind.into(), weight, size }
    }
}

/// Configuration for procedural world generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Seed for the noise field.
    pub seed: u32,
    /// Samples at or below this noise value are discarded.
    pub threshold: f64,
    /// Samples per chunk edge.
    pub chunk_size: u32,
    /// World units between samples; a chunk spans `chunk_size * voxel_scale` units.
    pub voxel_scale: u32,
    /// Feature size multiplier for the noise field.
    pub noise_scale: f64,
    /// Kinds of objects placed on kept samples.
    pub objects: Vec<ObjectWeight>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            threshold: 0.3,
            chunk_size: 16,
            voxel_scale: 1,
            noise_scale: 1.0,
            objects: vec![
                ObjectWeight::new("asteroid", 6.0, 1.0),
                ObjectWeight::new("nebula", 2.0, 4.0),
                ObjectWeight::new("rogue_planet", 1.0, 3.0),
                ObjectWeight::new("black_hole", 0.25, 2.0),
            ],
        }
    }
}

impl GenerationConfig {
    /// Edge length of one chunk in world units
    pub fn chunk_world_size(&self) -> u32 {
        self.chunk_size.max(1) * self.voxel_scale.max(1)
    }

    /// Noise scale handed to the noise field (`noise_scale / voxel_scale`)
    pub fn effective_noise_scale(&self) -> f64 {
        self.noise_scale / self.voxel_scale.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GenerationConfig = serde_json::from_str(r#"{"seed": 7, "voxel_scale": 2}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.threshold, 0.3);
        assert_eq!(config.chunk_world_size(), 32);
        assert_eq!(config.effective_noise_scale(), 0.5);
        assert_eq!(config.objects.len(), 4);
    }
}
