//! Turns kept chunk samples into object descriptions

use slipstream_net::ObjectSpec;

use super::chunk::ChunkData;
use super::config::{GenerationConfig, ObjectWeight};
use super::weighted::{self, BellCurveTable, SamplerError, WeightedRange};

/// Chooses an object kind for every kept sample of a chunk.
///
/// A sample's noise intensity above the threshold is rescaled to `[0, 1]` and
/// classified through the bell-curve ranges, so strong peaks and faint ridges
/// pick different kinds while overall frequencies follow the configured weights.
pub struct ObjectPalette {
    table: BellCurveTable,
    ranges: Vec<WeightedRange<ObjectWeight>>,
    threshold: f64,
    chunk_world_size: f32,
}

impl ObjectPalette {
    pub fn new(config: &GenerationConfig) -> Result<Self, SamplerError> {
        let table = BellCurveTable::default();
        let weights: Vec<(ObjectWeight, f64)> = config
            .objects
            .iter()
            .map(|o| (o.clone(), o.weight))
            .collect();
        let ranges = weighted::map_weights(&table, &weights)?;

        Ok(Self {
            table,
            ranges,
            threshold: config.threshold,
            chunk_world_size: config.chunk_world_size() as f32,
        })
    }

    /// Draw-space ranges per object kind
    pub fn ranges(&self) -> &[WeightedRange<ObjectWeight>] {
        &self.ranges
    }

    /// Kind chosen for a raw noise value
    pub fn kind_for(&self, value: f64) -> Option<&ObjectWeight> {
        let span = (1.0 - self.threshold).max(f64::EPSILON);
        let intensity = ((value - self.threshold) / span).clamp(0.0, 1.0);
        weighted::classify_value(&self.table, &self.ranges, intensity)
    }

    /// Object descriptions for every point of a chunk, in point order
    pub fn materialize(&self, chunk: &ChunkData) -> Vec<ObjectSpec> {
        chunk
            .points
            .iter()
            .filter_map(|point| {
                let kind = self.kind_for(point.value)?;
                let world_x = chunk.coord.x.wrapping_mul(self.chunk_world_size as i32)
                    .wrapping_add(point.local_x as i32);
                let world_y = chunk.coord.y.wrapping_mul(self.chunk_world_size as i32)
                    .wrapping_add(point.local_y as i32);

                let position = chunk.world_position(point, self.chunk_world_size);
                let heading = hash_2d(world_x, world_y, 0x9E37) * 360.0;
                let pitch = hash_2d(world_x, world_y, 0x7F4A) * 360.0;

                Some(ObjectSpec {
                    position: position.to_array(),
                    rotation: [heading, pitch, 0.0],
                    size: [kind.size; 3],
                    ..ObjectSpec::new(
                        kind.kind.clone(),
                        format!("{}_{}_{}", kind.kind, world_x, world_y),
                        position.to_array(),
                    )
                })
            })
            .collect()
    }
}

/// Integer hash producing a value in [0, 1].
fn hash_2d(ix: i32, iy: i32, seed: u32) -> f32 {
    let mut h = (ix as u32).wrapping_mul(374761393)
        .wrapping_add((iy as u32).wrapping_mul(668265263))
        .wrapping_add(seed.wrapping_mul(1274126177));
    h = (h ^ (h >> 13)).wrapping_mul(1103515245);
    h = h ^ (h >> 16);
    (h & 0x7FFFFFFF) as f32 / 0x7FFFFFFF_u32 as f32
}
