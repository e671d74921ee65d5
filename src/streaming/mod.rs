//! Streaming of generated chunks around a moving reference point

pub mod window;

pub use window::{ChunkMaterializer, StreamingConfig, StreamingWindow, WindowUpdate};
