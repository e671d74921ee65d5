//! Procedural world generation.
//!
//! The pipeline:
//! 1. `NoiseField` samples a seeded two-octave simplex field
//! 2. `ChunkStore` keeps samples above threshold per chunk, generated once and cached
//! 3. `ObjectPalette` turns kept samples into object descriptions through the
//!    weighted bell-curve sampler
//!
//! `WorldGen` owns all three and the seed lifecycle.

pub mod config;
pub mod chunk;
pub mod noise_field;
pub mod chunk_store;
pub mod weighted;
pub mod placement;

pub use config::{GenerationConfig, ObjectWeight};
pub use chunk::{ChunkCoord, ChunkData, ChunkPoint};
pub use noise_field::NoiseField;
pub use chunk_store::ChunkStore;
pub use weighted::{BellCurveTable, SamplerError, WeightedRange};
pub use placement::ObjectPalette;

use std::sync::Arc;
use std::time::Instant;

use slipstream_net::ObjectSpec;

/// Owned world generation state: chunk cache, noise seed and object palette.
pub struct WorldGen {
    store: ChunkStore,
    palette: ObjectPalette,
}

impl WorldGen {
    /// Create from configuration. Fails if the object weights can't be normalized.
    pub fn new(config: &GenerationConfig) -> Result<Self, SamplerError> {
        Ok(Self {
            store: ChunkStore::new(config),
            palette: ObjectPalette::new(config)?,
        })
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ChunkStore {
        &mut self.store
    }

    pub fn palette(&self) -> &ObjectPalette {
        &self.palette
    }

    pub fn seed(&self) -> u32 {
        self.store.seed()
    }

    pub fn chunk_world_size(&self) -> f32 {
        self.store.chunk_world_size() as f32
    }

    /// Switch seeds. The cache is cleared so every chunk seen afterwards
    /// belongs to the new world. Setting the current seed is a no-op.
    pub fn set_seed(&mut self, seed: u32) {
        if seed == self.store.seed() {
            return;
        }
        log::info!("World seed changed {} -> {}, dropping {} cached chunks", self.store.seed(), seed, self.store.len());
        self.store.reseed(seed);
        self.store.clear();
    }

    pub fn get_or_generate(&mut self, coord: ChunkCoord) -> Arc<ChunkData> {
        self.store.get_or_generate(coord)
    }

    /// Object descriptions for a generated chunk
    pub fn materialize(&self, chunk: &ChunkData) -> Vec<ObjectSpec> {
        self.palette.materialize(chunk)
    }

    /// Generate every chunk within `radius` (Chebyshev) of `center` in parallel.
    ///
    /// Returns the number of chunks newly generated.
    pub fn generate_around(&mut self, center: ChunkCoord, radius: u32) -> usize {
        let r = radius as i32;
        let coords: Vec<ChunkCoord> = (center.x - r..=center.x + r)
            .flat_map(|x| (center.y - r..=center.y + r).map(move |y| ChunkCoord::new(x, y)))
            .collect();

        let start = Instant::now();
        let count = self.store.generate_many(&coords);
        log::info!(
            "Generated {} of {} chunks around ({}, {}) in {:.1}ms",
            count,
            coords.len(),
            center.x,
            center.y,
            start.elapsed().as_secs_f64() * 1000.0
        );
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_seed_clears_cache() {
        let coords: Vec<ChunkCoord> = (-2..2).map(|i| ChunkCoord::new(i, -i)).collect();
        let mut world = WorldGen::new(&GenerationConfig::default()).unwrap();
        let old: Vec<ChunkData> = coords.iter().map(|&c| (*world.get_or_generate(c)).clone()).collect();

        world.set_seed(world.seed());
        assert_eq!(world.store().len(), 4);

        world.set_seed(999);
        assert!(world.store().is_empty());
        let new: Vec<ChunkData> = coords.iter().map(|&c| (*world.get_or_generate(c)).clone()).collect();
        assert_ne!(old, new);

        world.set_seed(GenerationConfig::default().seed);
        let again: Vec<ChunkData> = coords.iter().map(|&c| (*world.get_or_generate(c)).clone()).collect();
        assert_eq!(old, again);
    }

    #[test]
    fn test_generate_around_fills_square() {
        let mut world = WorldGen::new(&GenerationConfig::default()).unwrap();
        assert_eq!(world.generate_around(ChunkCoord::new(3, -3), 1), 9);
        assert!(world.store().contains(ChunkCoord::new(4, -2)));
        assert_eq!(world.generate_around(ChunkCoord::new(3, -3), 2), 16);
    }
}
