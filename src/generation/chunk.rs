//! Chunk coordinates and generated chunk content

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;

/// Integer coordinate of a chunk in the world's horizontal plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing a horizontal world position.
    ///
    /// Uses floor division so boundary positions resolve to the chunk that
    /// starts there and negative positions land in negative chunks.
    pub fn from_world(x: f32, y: f32, chunk_world_size: f32) -> Self {
        Self {
            x: (x / chunk_world_size).floor() as i32,
            y: (y / chunk_world_size).floor() as i32,
        }
    }

    /// Chebyshev distance between two chunks
    pub fn chebyshev(&self, other: ChunkCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// World-space origin (min corner) of this chunk
    pub fn world_origin(&self, chunk_world_size: f32) -> Vec3 {
        Vec3::new(
            self.x as f32 * chunk_world_size,
            self.y as f32 * chunk_world_size,
            0.0,
        )
    }
}

/// One sample kept from a chunk: local offset within the chunk and noise value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkPoint {
    pub local_x: u32,
    pub local_y: u32,
    pub value: f64,
}

/// Generated, immutable content of one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkData {
    pub coord: ChunkCoord,
    /// Samples above threshold, in row-major scan order
    pub points: Vec<ChunkPoint>,
}

impl ChunkData {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// World position of a point in this chunk
    pub fn world_position(&self, point: &ChunkPoint, chunk_world_size: f32) -> Vec3 {
        self.coord.world_origin(chunk_world_size)
            + Vec3::new(point.local_x as f32, point.local_y as f32, 0.0)
    }
}
