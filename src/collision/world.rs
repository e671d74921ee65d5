//! Per-frame fine collision pass

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::types::Vec3;

use super::CollisionConfig;
use super::entity::{Bounds, CollisionEntity, EntityId, PositionSource, Role};
use super::proximity::{EntityPosition, PositionSnapshot, ProximityIndex, ProximityPruner};
use super::report::CollisionReport;

/// Registered actors and colliders plus the reports from the latest pass.
///
/// Each [`update`](Self::update) discards the previous reports, refreshes
/// live positions, publishes them to the proximity index and checks the
/// pairs of the current proximity map.
pub struct CollisionWorld {
    config: CollisionConfig,
    entities: BTreeMap<EntityId, CollisionEntity>,
    next_id: u64,
    index: Arc<ProximityIndex>,
    reports: Vec<CollisionReport>,
}

impl CollisionWorld {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            entities: BTreeMap::new(),
            next_id: 1,
            index: Arc::new(ProximityIndex::new()),
            reports: Vec::new(),
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Shared proximity index, for a background pruner
    pub fn index(&self) -> Arc<ProximityIndex> {
        self.index.clone()
    }

    /// Start a background pruner for this world on its own runtime
    pub fn spawn_pruner(&self) -> std::io::Result<ProximityPruner> {
        ProximityPruner::new(self.index(), self.config.proximity_threshold, self.config.refresh_interval())
    }

    fn insert(&mut self, name: &str, role: Role, position: Vec3, bounds: Bounds) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, CollisionEntity::new(id, name, role, position, bounds));
        id
    }

    pub fn add_actor(&mut self, name: &str, position: Vec3, bounds: Bounds) -> EntityId {
        self.insert(name, Role::Actor, position, bounds)
    }

    pub fn add_collider(&mut self, name: &str, position: Vec3, bounds: Bounds) -> EntityId {
        self.insert(name, Role::Collider, position, bounds)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<CollisionEntity> {
        self.entities.remove(&id)
    }

    /// Remove every entity and report
    pub fn clear(&mut self) {
        self.entities.clear();
        self.reports.clear();
        self.index.publish_positions(PositionSnapshot::default());
    }

    pub fn get(&self, id: EntityId) -> Option<&CollisionEntity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &CollisionEntity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        self.entities.get_mut(&id).map(|e| e.position = position).is_some()
    }

    /// Follow a live position source; the position is refreshed every update
    pub fn attach_source(&mut self, id: EntityId, source: Arc<dyn PositionSource>) -> bool {
        self.entities.get_mut(&id).map(|e| e.source = Some(source)).is_some()
    }

    pub fn detach_source(&mut self, id: EntityId) -> bool {
        self.entities.get_mut(&id).map(|e| e.source = None).is_some()
    }

    /// Switch an entity between its sphere and mesh representations
    pub fn set_bounds(&mut self, id: EntityId, bounds: Bounds) -> bool {
        self.entities.get_mut(&id).map(|e| e.bounds = bounds).is_some()
    }

    /// Reports from the latest update
    pub fn reports(&self) -> &[CollisionReport] {
        &self.reports
    }

    /// Reports from the latest update involving `id`
    pub fn reports_for(&self, id: EntityId) -> &[CollisionReport] {
        self.entities.get(&id).map(|e| e.reports()).unwrap_or(&[])
    }

    /// Positions of every entity, grouped by role
    pub fn snapshot(&self) -> PositionSnapshot {
        let mut snapshot = PositionSnapshot::default();
        for e in self.entities.values() {
            let entry = EntityPosition { id: e.id, position: e.position };
            match e.role {
                Role::Actor => snapshot.actors.push(entry),
                Role::Collider => snapshot.colliders.push(entry),
            }
        }
        snapshot
    }

    /// Publish current positions and rebuild the proximity map synchronously.
    ///
    /// For callers without a background pruner.
    pub fn refresh_proximity(&self) {
        self.index.publish_positions(self.snapshot());
        self.index.refresh(self.config.proximity_threshold);
    }

    /// Run the fine pass and return this frame's reports
    pub fn update(&mut self) -> &[CollisionReport] {
        self.reports.clear();
        for entity in self.entities.values_mut() {
            entity.reports.clear();
            entity.refresh_position();
        }
        self.index.publish_positions(self.snapshot());

        let map = self.index.current();
        let mut found = Vec::new();
        for collider in self.entities.values().filter(|e| e.role == Role::Collider) {
            for actor_id in map.actors_near(collider.id) {
                // Entities removed since the map was built are skipped
                let Some(actor) = self.entities.get(actor_id) else {
                    continue;
                };
                if actor.role != Role::Actor {
                    continue;
                }
                if self.overlaps(actor, collider) {
                    found.push(CollisionReport {
                        actor: actor.id,
                        actor_name: actor.name.clone(),
                        collider: collider.id,
                        collider_name: collider.name.clone(),
                        actor_position: actor.position,
                        collider_position: collider.position,
                    });
                }
            }
        }

        for report in &found {
            if let Some(actor) = self.entities.get_mut(&report.actor) {
                actor.reports.push(report.clone());
            }
            if let Some(collider) = self.entities.get_mut(&report.collider) {
                collider.reports.push(report.clone());
            }
        }
        self.reports = found;
        &self.reports
    }

    fn overlaps(&self, actor: &CollisionEntity, collider: &CollisionEntity) -> bool {
        let distance = actor.position.distance(collider.position);
        if distance > self.config.outer_cutoff {
            return false;
        }
        match (&actor.bounds, &collider.bounds) {
            // Both exact: no sphere proxy for this pair
            (Bounds::Mesh(a), Bounds::Mesh(b)) => a.intersects(actor.position, b, collider.position),
            _ => distance <= actor.radius() + collider.radius(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::mesh::TriangleMesh;
    use std::collections::BTreeSet;
    use std::sync::RwLock;

    fn sphere(radius: f32) -> Bounds {
        Bounds::Sphere { radius }
    }

    fn cube_mesh(half: f32) -> Bounds {
        let mut points = Vec::new();
        for &x in &[-half, half] {
            for &y in &[-half, half] {
                for &z in &[-half, half] {
                    points.push(Vec3::new(x, y, z));
                }
            }
        }
        Bounds::Mesh(Arc::new(TriangleMesh::from_points(&points).unwrap()))
    }

    #[test]
    fn test_reports_overlapping_spheres() {
        let mut world = CollisionWorld::new(CollisionConfig::default());
        let ship = world.add_actor("ship", Vec3::ZERO, sphere(1.0));
        let rock = world.add_collider("rock", Vec3::new(1.5, 0.0, 0.0), sphere(1.0));
        world.add_collider("far", Vec3::new(10.0, 0.0, 0.0), sphere(1.0));

        world.refresh_proximity();
        let reports = world.update().to_vec();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].actor, ship);
        assert_eq!(reports[0].collider_name, "rock");
        assert_eq!(reports[0].collider_position, Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(world.reports_for(ship), reports.as_slice());
        assert_eq!(world.reports_for(rock), reports.as_slice());
    }

    #[test]
    fn test_nothing_reported_without_proximity_map() {
        let mut world = CollisionWorld::new(CollisionConfig::default());
        world.add_actor("ship", Vec3::ZERO, sphere(1.0));
        world.add_collider("rock", Vec3::ZERO, sphere(1.0));

        // The fine pass only sees pairs from a built map
        assert!(world.update().is_empty());
        world.refresh_proximity();
        assert_eq!(world.update().len(), 1);
    }

    #[test]
    fn test_reports_cleared_each_update() {
        let mut world = CollisionWorld::new(CollisionConfig::default());
        let ship = world.add_actor("ship", Vec3::ZERO, sphere(1.0));
        world.add_collider("rock", Vec3::ZERO, sphere(1.0));
        world.refresh_proximity();
        assert_eq!(world.update().len(), 1);

        world.set_position(ship, Vec3::new(5.0, 0.0, 0.0));
        assert!(world.update().is_empty());
        assert!(world.reports_for(ship).is_empty());
    }

    #[test]
    fn test_outer_cutoff_wins_over_radii() {
        let mut world = CollisionWorld::new(CollisionConfig::default());
        world.add_actor("ship", Vec3::ZERO, sphere(50.0));
        world.add_collider("giant", Vec3::new(76.0, 0.0, 0.0), sphere(50.0));
        world.refresh_proximity();
        assert!(world.update().is_empty());
    }

    #[test]
    fn test_multiple_reports_per_entity() {
        let mut world = CollisionWorld::new(CollisionConfig::default());
        let ship = world.add_actor("ship", Vec3::ZERO, sphere(2.0));
        world.add_collider("a", Vec3::X, sphere(0.5));
        world.add_collider("b", -Vec3::X, sphere(0.5));
        world.refresh_proximity();
        world.update();
        assert_eq!(world.reports_for(ship).len(), 2);
        assert_eq!(world.reports().len(), 2);
    }

    #[test]
    fn test_live_source_moves_collider() {
        let mut world = CollisionWorld::new(CollisionConfig::default());
        world.add_actor("ship", Vec3::ZERO, sphere(1.0));
        let drone = world.add_collider("drone", Vec3::new(50.0, 0.0, 0.0), sphere(1.0));

        let node = Arc::new(RwLock::new(Vec3::new(50.0, 0.0, 0.0)));
        let source = node.clone();
        world.attach_source(drone, Arc::new(move || *source.read().unwrap()));
        world.refresh_proximity();
        assert!(world.update().is_empty());

        *node.write().unwrap() = Vec3::new(0.5, 0.0, 0.0);
        let reports = world.update();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].collider_position, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_mesh_pairs_use_exact_check() {
        let mut world = CollisionWorld::new(CollisionConfig::default());
        let ship = world.add_actor("ship", Vec3::ZERO, cube_mesh(0.5));
        // Sphere proxies (radius ~0.87 each) would overlap at 1.6, the cubes don't
        let crate_id = world.add_collider("crate", Vec3::new(1.6, 0.0, 0.0), cube_mesh(0.5));
        world.refresh_proximity();
        assert!(world.update().is_empty());

        world.set_position(crate_id, Vec3::new(0.8, 0.2, 0.1));
        assert_eq!(world.update().len(), 1);

        // Mixed pairs fall back to the sphere proxy
        world.set_bounds(ship, sphere(0.9));
        world.set_position(crate_id, Vec3::new(1.6, 0.0, 0.0));
        assert_eq!(world.update().len(), 1);
    }

    #[test]
    fn test_removed_entity_skipped() {
        let mut world = CollisionWorld::new(CollisionConfig::default());
        let ship = world.add_actor("ship", Vec3::ZERO, sphere(1.0));
        world.add_collider("rock", Vec3::ZERO, sphere(1.0));
        world.refresh_proximity();
        world.remove(ship);
        assert!(world.update().is_empty());

        world.clear();
        assert!(world.is_empty());
    }

    /// Simple hash-based RNG for deterministic placement
    struct SimpleHash(u64);

    impl SimpleHash {
        fn float(&mut self) -> f32 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 40) as f32 / (1u64 << 24) as f32
        }
    }

    #[test]
    fn test_fine_pass_matches_brute_force_after_refresh() {
        let mut rng = SimpleHash(2024);
        let mut world = CollisionWorld::new(CollisionConfig::default());
        let point = |rng: &mut SimpleHash| {
            Vec3::new(rng.float() * 200.0, rng.float() * 200.0, rng.float() * 20.0)
        };
        for i in 0..40 {
            let p = point(&mut rng);
            world.add_actor(&format!("actor{}", i), p, sphere(1.0 + rng.float() * 10.0));
        }
        for i in 0..60 {
            let p = point(&mut rng);
            world.add_collider(&format!("collider{}", i), p, sphere(1.0 + rng.float() * 10.0));
        }

        world.refresh_proximity();
        let map = world.index().current();
        let reported: BTreeSet<(EntityId, EntityId)> =
            world.update().iter().map(|r| (r.actor, r.collider)).collect();

        // Subset of the coarse map
        for &(a, c) in &reported {
            assert!(map.contains_pair(a, c));
        }

        // And complete: every truly overlapping pair is found
        let entities: Vec<CollisionEntity> = world.entities().cloned().collect();
        let mut expected = BTreeSet::new();
        for a in entities.iter().filter(|e| e.role == Role::Actor) {
            for c in entities.iter().filter(|e| e.role == Role::Collider) {
                let d = a.position.distance(c.position);
                if d <= 75.0 && d <= a.radius() + c.radius() {
                    expected.insert((a.id, c.id));
                }
            }
        }
        assert_eq!(reported, expected);
        assert!(!expected.is_empty());
    }
}
