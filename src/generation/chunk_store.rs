//! Generate-once cache of chunk content

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use super::chunk::{ChunkCoord, ChunkData, ChunkPoint};
use super::config::GenerationConfig;
use super::noise_field::NoiseField;

/// Generates chunk content from the noise field and caches it by coordinate.
///
/// Cached chunks are never regenerated or mutated; repeated lookups return
/// the same `Arc`. The cache only grows, except through [`ChunkStore::clear`].
pub struct ChunkStore {
    field: NoiseField,
    threshold: f64,
    chunk_world_size: u32,
    step: u32,
    chunks: HashMap<ChunkCoord, Arc<ChunkData>>,
    /// Total chunks generated since construction (not reset by `clear`)
    generated: u64,
}

impl ChunkStore {
    /// Create an empty store from configuration
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            field: NoiseField::new(config.seed, config.effective_noise_scale()),
            threshold: config.threshold,
            chunk_world_size: config.chunk_world_size(),
            step: config.voxel_scale.max(1),
            chunks: HashMap::new(),
            generated: 0,
        }
    }

    /// Edge length of one chunk in world units
    pub fn chunk_world_size(&self) -> u32 {
        self.chunk_world_size
    }

    /// Noise threshold samples must exceed
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Current seed
    pub fn seed(&self) -> u32 {
        self.field.seed()
    }

    /// Reseed the noise field. Already cached chunks are kept as they are.
    pub fn reseed(&mut self, seed: u32) {
        self.field.reseed(seed);
    }

    /// Drop every cached chunk
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Build a chunk's content without touching the cache
    pub fn generate(&self, coord: ChunkCoord) -> ChunkData {
        let size = self.chunk_world_size as i64;
        let origin_x = coord.x as i64 * size;
        let origin_y = coord.y as i64 * size;

        let mut points = Vec::new();
        for i in (0..self.chunk_world_size).step_by(self.step as usize) {
            for j in (0..self.chunk_world_size).step_by(self.step as usize) {
                let value = self.field.sample(
                    (origin_x + i as i64) as f64,
                    (origin_y + j as i64) as f64,
                    0.0,
                );
                if value > self.threshold {
                    points.push(ChunkPoint { local_x: i, local_y: j, value });
                }
            }
        }

        ChunkData { coord, points }
    }

    /// Cached content for `coord`, generating and caching it on first request
    pub fn get_or_generate(&mut self, coord: ChunkCoord) -> Arc<ChunkData> {
        if let Some(chunk) = self.chunks.get(&coord) {
            return chunk.clone();
        }

        let chunk = Arc::new(self.generate(coord));
        log::debug!("Generated chunk ({}, {}) with {} points", coord.x, coord.y, chunk.len());
        self.generated += 1;
        self.chunks.insert(coord, chunk.clone());
        chunk
    }

    /// Generate every missing chunk in `coords` in parallel.
    ///
    /// Returns the number of chunks newly generated.
    pub fn generate_many(&mut self, coords: &[ChunkCoord]) -> usize {
        let mut missing: Vec<ChunkCoord> = coords
            .iter()
            .copied()
            .filter(|c| !self.chunks.contains_key(c))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        let store = &*self;
        let generated: Vec<ChunkData> = missing.par_iter().map(|&c| store.generate(c)).collect();

        let count = generated.len();
        for chunk in generated {
            self.chunks.insert(chunk.coord, Arc::new(chunk));
        }
        self.generated += count as u64;
        count
    }

    /// Cached content for `coord`, if generated
    pub fn get(&self, coord: ChunkCoord) -> Option<Arc<ChunkData>> {
        self.chunks.get(&coord).cloned()
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of cached chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total chunks generated since construction
    pub fn generated_count(&self) -> u64 {
        self.generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(seed: u32) -> ChunkStore {
        ChunkStore::new(&GenerationConfig { seed, ..Default::default() })
    }

    #[test]
    fn test_generation_is_deterministic() {
        for seed in [0, 1, 12345, u32::MAX] {
            let mut a = store(seed);
            let mut b = store(seed);
            for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-3, 7)] {
                assert_eq!(*a.get_or_generate(coord), *b.get_or_generate(coord));
            }
        }
    }

    #[test]
    fn test_cached_chunk_not_regenerated() {
        let mut store = store(5);
        let first = store.get_or_generate(ChunkCoord::new(1, 1));
        let second = store.get_or_generate(ChunkCoord::new(1, 1));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.generated_count(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_points_respect_threshold_and_bounds() {
        let mut store = store(11);
        let mut total = 0;
        for x in -2..2 {
            for y in -2..2 {
                let chunk = store.get_or_generate(ChunkCoord::new(x, y));
                for p in &chunk.points {
                    assert!(p.value > 0.3);
                    assert!(p.local_x < 16 && p.local_y < 16);
                }
                total += chunk.len();
            }
        }
        // 16 chunks of 256 samples: some, but not all, are kept
        assert!(total > 0 && total < 16 * 256);
    }

    #[test]
    fn test_voxel_scale_steps_samples() {
        let config = GenerationConfig { voxel_scale: 2, threshold: -2.0, ..Default::default() };
        let store = ChunkStore::new(&config);
        let chunk = store.generate(ChunkCoord::new(0, 0));

        // Everything passes a threshold below the field's range
        assert_eq!(chunk.len(), 16 * 16);
        assert!(chunk.points.iter().all(|p| p.local_x % 2 == 0 && p.local_x < 32));
    }

    #[test]
    fn test_reseed_keeps_cache() {
        let mut store = store(1);
        let before = store.get_or_generate(ChunkCoord::new(0, 0));
        store.reseed(2);
        assert!(Arc::ptr_eq(&before, &store.get_or_generate(ChunkCoord::new(0, 0))));

        store.clear();
        assert!(store.is_empty());
        let fresh = store.get_or_generate(ChunkCoord::new(0, 0));
        assert_eq!(*fresh, ChunkStore::new(&GenerationConfig { seed: 2, ..Default::default() })
            .generate(ChunkCoord::new(0, 0)));
    }

    #[test]
    fn test_generate_many_matches_sequential() {
        let coords: Vec<ChunkCoord> = (-2..=2)
            .flat_map(|x| (-2..=2).map(move |y| ChunkCoord::new(x, y)))
            .collect();
        let mut parallel = store(77);
        parallel.get_or_generate(ChunkCoord::new(0, 0));
        assert_eq!(parallel.generate_many(&coords), 24);
        assert_eq!(parallel.generate_many(&coords), 0);

        let mut sequential = store(77);
        for &c in &coords {
            assert_eq!(*parallel.get(c).unwrap(), *sequential.get_or_generate(c));
        }
    }
}
