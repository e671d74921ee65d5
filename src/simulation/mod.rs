//! Server-side simulation: commands in, world streaming, physics, collisions, events out

pub mod config;
pub mod runner;

pub use config::{PlaneConfig, SimulationConfig};
pub use runner::{SHIP_HANDLE, Simulation};
