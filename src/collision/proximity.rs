//! Coarse actor/collider adjacency, rebuilt off the frame loop
//!
//! The fine collision pass only checks pairs listed in the current
//! [`ProximityMap`]. Maps are immutable once built: a refresh builds a fresh
//! map from the latest published positions and swaps the `Arc`, so readers
//! holding the previous map are never disturbed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tokio::runtime::Runtime;
use tokio::sync::watch;

use crate::core::types::Vec3;

use super::entity::EntityId;

/// Position of one entity as seen by the pruner
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPosition {
    pub id: EntityId,
    pub position: Vec3,
}

/// Positions of every actor and collider at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionSnapshot {
    pub actors: Vec<EntityPosition>,
    pub colliders: Vec<EntityPosition>,
}

/// Neighbor lists in both directions: actor -> nearby colliders and
/// collider -> nearby actors
#[derive(Debug, Clone, Default)]
pub struct ProximityMap {
    actor_neighbors: HashMap<EntityId, Vec<EntityId>>,
    collider_neighbors: HashMap<EntityId, Vec<EntityId>>,
    threshold: f32,
}

impl ProximityMap {
    /// Pair every actor with every collider within `threshold` world units
    pub fn build(snapshot: &PositionSnapshot, threshold: f32) -> Self {
        let actor_neighbors: HashMap<EntityId, Vec<EntityId>> = snapshot
            .actors
            .par_iter()
            .map(|actor| {
                let near = snapshot
                    .colliders
                    .iter()
                    .filter(|c| c.position.distance(actor.position) <= threshold)
                    .map(|c| c.id)
                    .collect();
                (actor.id, near)
            })
            .collect();

        let mut collider_neighbors: HashMap<EntityId, Vec<EntityId>> = snapshot
            .colliders
            .iter()
            .map(|c| (c.id, Vec::new()))
            .collect();
        // Walk actors in snapshot order so neighbor lists are deterministic
        for actor in &snapshot.actors {
            if let Some(near) = actor_neighbors.get(&actor.id) {
                for collider in near {
                    if let Some(list) = collider_neighbors.get_mut(collider) {
                        list.push(actor.id);
                    }
                }
            }
        }

        Self { actor_neighbors, collider_neighbors, threshold }
    }

    /// Threshold the map was built with
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Colliders near an actor
    pub fn colliders_near(&self, actor: EntityId) -> &[EntityId] {
        self.actor_neighbors.get(&actor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Actors near a collider
    pub fn actors_near(&self, collider: EntityId) -> &[EntityId] {
        self.collider_neighbors.get(&collider).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_pair(&self, actor: EntityId, collider: EntityId) -> bool {
        self.colliders_near(actor).contains(&collider)
    }

    /// Total number of actor/collider pairs
    pub fn pair_count(&self) -> usize {
        self.actor_neighbors.values().map(Vec::len).sum()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared, double-buffered proximity state.
///
/// The frame loop publishes positions and reads the current map; the pruner
/// rebuilds the map from the published positions. Locks are held only long
/// enough to clone or replace an `Arc`.
#[derive(Debug, Default)]
pub struct ProximityIndex {
    positions: RwLock<Arc<PositionSnapshot>>,
    map: RwLock<Arc<ProximityMap>>,
    rebuilds: AtomicU64,
}

impl ProximityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the positions future rebuilds will use
    pub fn publish_positions(&self, snapshot: PositionSnapshot) {
        *write(&self.positions) = Arc::new(snapshot);
    }

    /// Latest published positions
    pub fn positions(&self) -> Arc<PositionSnapshot> {
        read(&self.positions).clone()
    }

    /// Current map. Stays valid (and unchanged) however many rebuilds follow.
    pub fn current(&self) -> Arc<ProximityMap> {
        read(&self.map).clone()
    }

    /// Rebuild the map from the latest positions and swap it in
    pub fn refresh(&self, threshold: f32) -> Arc<ProximityMap> {
        let positions = self.positions();
        let start = Instant::now();
        let map = Arc::new(ProximityMap::build(&positions, threshold));
        *write(&self.map) = map.clone();

        let count = self.rebuilds.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!(
            "Proximity rebuild #{}: {} actors x {} colliders -> {} pairs in {:.2}ms",
            count,
            positions.actors.len(),
            positions.colliders.len(),
            map.pair_count(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        map
    }

    /// Number of completed rebuilds
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }
}

/// Background task that keeps a [`ProximityIndex`] refreshed on a fixed interval.
///
/// Stops when dropped.
pub struct ProximityPruner {
    shutdown: watch::Sender<bool>,
    /// Dedicated runtime (None when spawned on the caller's runtime)
    #[allow(dead_code)]
    runtime: Option<Runtime>,
}

impl ProximityPruner {
    /// Start the pruner on its own runtime
    pub fn new(index: Arc<ProximityIndex>, threshold: f32, interval: Duration) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("proximity-pruner")
            .enable_time()
            .build()?;
        let (shutdown, rx) = watch::channel(false);
        runtime.spawn(Self::run(index, threshold, interval, rx));

        Ok(Self { shutdown, runtime: Some(runtime) })
    }

    /// Start the pruner on the current tokio runtime.
    ///
    /// Panics if called outside a tokio runtime context.
    pub fn new_with_current_runtime(index: Arc<ProximityIndex>, threshold: f32, interval: Duration) -> Self {
        let (shutdown, rx) = watch::channel(false);
        tokio::spawn(Self::run(index, threshold, interval, rx));
        Self { shutdown, runtime: None }
    }

    async fn run(
        index: Arc<ProximityIndex>,
        threshold: f32,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    index.refresh(threshold);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        log::debug!("Proximity pruner stopped");
    }

    /// Ask the task to stop. Also happens on drop.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for ProximityPruner {
    fn drop(&mut self) {
        self.stop();
    }
}
