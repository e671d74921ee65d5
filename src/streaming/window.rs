//! Active chunk window around a tracked position

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;
use crate::generation::{ChunkCoord, ChunkData, ChunkStore};

/// Streaming window configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chebyshev radius of the active window in chunks (0 = single chunk)
    pub render_distance: u32,
    /// World units per reference-position unit, for references tracked in a
    /// different unit than the chunk grid
    pub scale_multiplier: f32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            render_distance: 2,
            scale_multiplier: 1.0,
        }
    }
}

/// Receives chunks the window wants materialized
pub trait ChunkMaterializer {
    /// Called once per newly generated chunk, with its world-space origin
    fn materialize(&mut self, chunk: &ChunkData, origin: Vec3);
}

/// Outcome of one [`StreamingWindow::update`] call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowUpdate {
    /// Chunk containing the reference position
    pub center: ChunkCoord,
    /// Chunk generated by this call, if any
    pub generated: Option<ChunkCoord>,
    /// Chunks that became active this call
    pub entered: Vec<ChunkCoord>,
    /// Chunks that left the window this call
    pub evicted: Vec<ChunkCoord>,
}

/// Tracks which generated chunks lie inside the render window.
///
/// Each update generates at most one missing chunk, which bounds the
/// per-call cost; callers wanting faster fill call `update` more often.
/// Newly generated chunks are handed out through a two-phase handshake:
/// read [`pending_chunks`](Self::pending_chunks), materialize them, then
/// [`commit`](Self::commit).
#[derive(Debug, Clone)]
pub struct StreamingWindow {
    config: StreamingConfig,
    center: Option<ChunkCoord>,
    active: BTreeSet<ChunkCoord>,
    /// Generated since the last commit
    new_chunks: BTreeSet<ChunkCoord>,
}

impl StreamingWindow {
    pub fn new(config: StreamingConfig) -> Self {
        Self {
            config,
            center: None,
            active: BTreeSet::new(),
            new_chunks: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Chunk at the center of the window as of the last update
    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    /// Chunks currently inside the window that have been generated
    pub fn active_chunks(&self) -> &BTreeSet<ChunkCoord> {
        &self.active
    }

    pub fn is_active(&self, coord: ChunkCoord) -> bool {
        self.active.contains(&coord)
    }

    /// Chunk containing a world position
    pub fn chunk_at(&self, store: &ChunkStore, position: Vec3) -> ChunkCoord {
        let scale = if self.config.scale_multiplier > 0.0 { self.config.scale_multiplier } else { 1.0 };
        ChunkCoord::from_world(position.x, position.y, store.chunk_world_size() as f32 * scale)
    }

    /// Whether `coord` lies inside the window centered on `center`
    pub fn in_window(&self, center: ChunkCoord, coord: ChunkCoord) -> bool {
        center.chebyshev(coord) <= self.config.render_distance
    }

    /// Recompute the window around `position`.
    ///
    /// Scans the window row by row. Chunks already generated become active;
    /// the first missing chunk is generated, becomes active and is recorded as
    /// new. Further missing chunks wait for later calls. Finally, active chunks
    /// outside the window are dropped.
    pub fn update(&mut self, store: &mut ChunkStore, position: Vec3) -> WindowUpdate {
        let center = self.chunk_at(store, position);
        let r = i32::try_from(self.config.render_distance).unwrap_or(i32::MAX);
        let mut update = WindowUpdate { center, ..Default::default() };

        // Saturate at the grid edge rather than wrapping around it
        for x in center.x.saturating_sub(r)..=center.x.saturating_add(r) {
            for y in center.y.saturating_sub(r)..=center.y.saturating_add(r) {
                let coord = ChunkCoord::new(x, y);
                if !store.contains(coord) {
                    if update.generated.is_some() {
                        continue;
                    }
                    store.get_or_generate(coord);
                    self.new_chunks.insert(coord);
                    update.generated = Some(coord);
                }
                if self.active.insert(coord) {
                    update.entered.push(coord);
                }
            }
        }

        let evicted: Vec<ChunkCoord> = self
            .active
            .iter()
            .copied()
            .filter(|&c| !self.in_window(center, c))
            .collect();
        for coord in &evicted {
            self.active.remove(coord);
        }
        update.evicted = evicted;

        if self.center != Some(center) {
            log::debug!("Streaming window moved to ({}, {})", center.x, center.y);
        }
        self.center = Some(center);
        update
    }

    /// Chunks generated since the last [`commit`](Self::commit), in coordinate order
    pub fn pending_chunks(&self) -> Vec<ChunkCoord> {
        self.new_chunks.iter().copied().collect()
    }

    /// Mark every pending chunk as delivered
    pub fn commit(&mut self) {
        self.new_chunks.clear();
    }

    /// Hand every pending chunk to `sink`, then commit.
    ///
    /// Returns the number of chunks delivered.
    pub fn deliver(&mut self, store: &ChunkStore, sink: &mut dyn ChunkMaterializer) -> usize {
        let pending = self.pending_chunks();
        let size = store.chunk_world_size() as f32;
        for &coord in &pending {
            if let Some(chunk) = store.get(coord) {
                sink.materialize(&chunk, coord.world_origin(size));
            }
        }
        self.commit();
        pending.len()
    }

    /// Forget all window state, e.g. after the chunk cache was cleared
    pub fn reset(&mut self) {
        self.center = None;
        self.active.clear();
        self.new_chunks.clear();
    }
}
