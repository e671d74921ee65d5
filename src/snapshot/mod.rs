//! Named save slots for simulation state
//!
//! Each slot is a `<name>.dat` file holding the pretty-printed JSON of a
//! [`SimulationSnapshot`], base64 encoded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub use slipstream_net::{SimulationSnapshot, SnapshotObjects};

/// File extension of save slots
pub const SLOT_EXTENSION: &str = "dat";

/// Errors raised while reading or writing save slots
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Slot is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Slot is not a valid snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid slot name: {0:?}")]
    InvalidSlotName(String),
}

/// Directory of save slots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the named slot
    pub fn slot_path(&self, name: &str) -> Result<PathBuf, SnapshotError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SnapshotError::InvalidSlotName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", name, SLOT_EXTENSION)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.slot_path(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Write a snapshot to the named slot, creating the directory if needed
    pub fn save(&self, name: &str, snapshot: &SimulationSnapshot) -> Result<(), SnapshotError> {
        let path = self.slot_path(name)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, STANDARD.encode(json))?;
        log::info!("Saved slot '{}' to {}", name, path.display());
        Ok(())
    }

    pub fn load(&self, name: &str) -> Result<SimulationSnapshot, SnapshotError> {
        let path = self.slot_path(name)?;
        let encoded = fs::read_to_string(&path)?;
        let json = STANDARD.decode(encoded.trim())?;
        let snapshot = serde_json::from_slice(&json)?;
        log::info!("Loaded slot '{}' from {}", name, path.display());
        Ok(snapshot)
    }

    /// Load the named slot, writing a default snapshot first if it doesn't exist
    pub fn load_or_init(&self, name: &str) -> Result<SimulationSnapshot, SnapshotError> {
        if self.exists(name) {
            return self.load(name);
        }
        let snapshot = SimulationSnapshot::default();
        self.save(name, &snapshot)?;
        Ok(snapshot)
    }

    /// Names of every slot in the directory, sorted
    pub fn list(&self) -> Result<Vec<String>, SnapshotError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SLOT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{ChunkCoord, GenerationConfig, WorldGen};
    use slipstream_net::ObjectSpec;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let mut snapshot = SimulationSnapshot {
            monitor_index: 2,
            seed: Some(777),
            ..Default::default()
        };
        snapshot
            .objects
            .obstacles
            .push(ObjectSpec::new("obstacle", "wall", [10.0, 0.0, 0.0]));

        store.save("session", &snapshot).unwrap();
        assert_eq!(store.load("session").unwrap(), snapshot);
    }

    #[test]
    fn test_slot_file_is_base64_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.save("a", &SimulationSnapshot::default()).unwrap();

        let raw = fs::read_to_string(dir.path().join("a.dat")).unwrap();
        let json = STANDARD.decode(raw.trim()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["OBJECTS"]["SHIP"]["id"], "ship");
    }

    #[test]
    fn test_load_or_init_creates_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("slots"));

        assert!(!store.exists("fresh"));
        let snapshot = store.load_or_init("fresh").unwrap();
        assert_eq!(snapshot, SimulationSnapshot::default());
        assert!(store.exists("fresh"));
    }

    #[test]
    fn test_list_slots() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.list().unwrap().is_empty());

        store.save("beta", &SimulationSnapshot::default()).unwrap();
        store.save("alpha", &SimulationSnapshot::default()).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_rejects_path_like_names() {
        let store = SnapshotStore::new("slots");
        assert!(matches!(store.slot_path("../etc"), Err(SnapshotError::InvalidSlotName(_))));
        assert!(matches!(store.slot_path(""), Err(SnapshotError::InvalidSlotName(_))));
    }

    #[test]
    fn test_corrupt_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        fs::write(dir.path().join("bad.dat"), "!!! not base64 !!!").unwrap();
        assert!(matches!(store.load("bad"), Err(SnapshotError::Base64(_))));

        fs::write(dir.path().join("text.dat"), STANDARD.encode("not json")).unwrap();
        assert!(matches!(store.load("text"), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn test_saved_seed_reproduces_world() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store
            .save("world", &SimulationSnapshot { seed: Some(4242), ..Default::default() })
            .unwrap();

        let coords: Vec<ChunkCoord> = (-2..=2).map(|i| ChunkCoord::new(i, -i)).collect();
        let build = || {
            let seed = store.load("world").unwrap().seed.unwrap();
            let mut generator = WorldGen::new(&GenerationConfig::default()).unwrap();
            generator.set_seed(seed);
            coords
                .iter()
                .map(|&c| (*generator.get_or_generate(c)).clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }
}
