//! Slipstream - procedural space-flight world streaming and rigid-body simulation

pub mod core;
pub mod math;
pub mod generation;
pub mod streaming;
pub mod physics;
pub mod collision;
pub mod snapshot;
pub mod simulation;
