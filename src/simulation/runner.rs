//! The single-threaded simulation loop body

use std::collections::BTreeMap;
use std::sync::Arc;

use slipstream_net::{ConfigCommand, Message, MessageQueue, ObjectSpec, ShipState, SimulationSnapshot};

use crate::collision::{Bounds, CollisionReport, CollisionWorld, EntityId, ProximityPruner};
use crate::core::{Result, Vec3};
use crate::generation::{ChunkCoord, ChunkData, WorldGen};
use crate::physics::{BodyHandle, BodyRef, RigidBody, RigidBodyIntegrator};
use crate::streaming::{ChunkMaterializer, StreamingWindow, WindowUpdate};

use super::config::SimulationConfig;

/// Handle of the player ship body
pub const SHIP_HANDLE: BodyHandle = BodyHandle(1);

/// Boundary plane handles are allocated from here up
const FIRST_PLANE_HANDLE: u64 = 1000;

/// Owns every subsystem and moves messages between them and the queue.
///
/// Nothing here blocks: inbound messages are drained once per [`step`](Self::step)
/// and outbound ones are only queued.
pub struct Simulation {
    config: SimulationConfig,
    world: WorldGen,
    window: StreamingWindow,
    physics: RigidBodyIntegrator,
    collisions: CollisionWorld,
    pruner: Option<ProximityPruner>,
    queue: Arc<MessageQueue>,
    snapshot: SimulationSnapshot,
    ship_entity: EntityId,
    chunk_colliders: BTreeMap<ChunkCoord, Vec<EntityId>>,
    obstacle_colliders: Vec<EntityId>,
    target_colliders: Vec<EntityId>,
    building: bool,
}

impl Simulation {
    /// Build a paused simulation from config and an initial snapshot.
    ///
    /// Physics starts on `START_SIMULATION`, streaming on `BUILD_WORLD`.
    pub fn new(config: SimulationConfig, queue: Arc<MessageQueue>, snapshot: SimulationSnapshot) -> Result<Self> {
        let world = WorldGen::new(&config.generation)?;
        let window = StreamingWindow::new(config.streaming.clone());

        let mut physics = RigidBodyIntegrator::new(config.physics.clone());
        for (i, plane) in config.planes.iter().enumerate() {
            physics.register_plane(
                BodyHandle(FIRST_PLANE_HANDLE + i as u64),
                &plane.name,
                plane.position,
                &plane.orientation,
                &plane.response,
                plane.magnetic_strength,
                &plane.magnetic_polarity,
            )?;
        }
        let mut ship = RigidBody::new(SHIP_HANDLE, "ship");
        ship.velocity_cap = config.ship_velocity_cap;
        ship.angular_cap = config.ship_angular_cap;
        physics.register(ship);
        physics.set_updating(false);

        let mut collisions = CollisionWorld::new(config.collision.clone());
        let ship_entity = collisions.add_actor("ship", Vec3::ZERO, Bounds::Sphere { radius: 0.5 });

        let mut sim = Self {
            config,
            world,
            window,
            physics,
            collisions,
            pruner: None,
            queue,
            snapshot: SimulationSnapshot::default(),
            ship_entity,
            chunk_colliders: BTreeMap::new(),
            obstacle_colliders: Vec::new(),
            target_colliders: Vec::new(),
            building: false,
        };
        sim.apply_snapshot(snapshot);
        // Seedless slots pin the generator's seed so saves reproduce the world
        if sim.snapshot.seed.is_none() {
            sim.snapshot.seed = Some(sim.world.seed());
        }
        Ok(sim)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn world(&self) -> &WorldGen {
        &self.world
    }

    pub fn window(&self) -> &StreamingWindow {
        &self.window
    }

    pub fn physics(&self) -> &RigidBodyIntegrator {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut RigidBodyIntegrator {
        &mut self.physics
    }

    pub fn collisions(&self) -> &CollisionWorld {
        &self.collisions
    }

    /// Current state in save-slot form
    pub fn snapshot(&self) -> &SimulationSnapshot {
        &self.snapshot
    }

    pub fn is_building(&self) -> bool {
        self.building
    }

    pub fn ship_entity(&self) -> EntityId {
        self.ship_entity
    }

    pub fn ship_state(&self) -> ShipState {
        match self.physics.body(SHIP_HANDLE.into()) {
            Some(ship) => ShipState {
                pos: ship.position.to_array(),
                rot: ship.orientation.to_array(),
            },
            None => ShipState::default(),
        }
    }

    fn ship_position(&self) -> Vec3 {
        self.physics
            .body(SHIP_HANDLE.into())
            .map(|b| b.position)
            .unwrap_or(Vec3::ZERO)
    }

    /// Rebuild the proximity map on a background task instead of every step.
    ///
    /// Must not be called from inside an async context; the pruner owns a runtime.
    pub fn enable_background_pruning(&mut self) -> std::io::Result<()> {
        if self.pruner.is_none() {
            self.pruner = Some(self.collisions.spawn_pruner()?);
        }
        Ok(())
    }

    /// Apply one inbound message
    pub fn handle_message(&mut self, msg: Message) {
        log::debug!("Dispatching {:?}", msg);
        match msg {
            Message::ClientInit => {
                // New clients get the full current configuration
                let snapshot = self.snapshot.clone();
                self.queue.send(Message::ClientConfig(ConfigCommand::ApplyConfig(snapshot)));
            }
            Message::ClientInfo { key, value } => {
                log::info!("Client info {} = {}", key, value);
            }
            Message::ClientReady => log::info!("Client ready"),
            Message::UpdateData { ship } => {
                self.move_ship(Vec3::from_array(ship.pos), Vec3::from_array(ship.rot));
            }
            Message::NewObject(spec) => {
                let id = spawn_collider(&mut self.collisions, &spec);
                self.obstacle_colliders.extend(id);
                self.snapshot.objects.obstacles.push(spec);
            }
            Message::ClientConfig(command) => self.apply_command(command),
            Message::BuildWorld => self.build_world(),
            Message::StartSimulation => {
                log::info!("Simulation started");
                self.physics.set_updating(true);
            }
            Message::ShipThrust { linear, angular } => {
                let ship = BodyRef::from(SHIP_HANDLE);
                if let Err(e) = self.physics.add_force(ship, &linear) {
                    log::error!("Rejected ship thrust: {}", e);
                }
                if let Err(e) = self.physics.add_angular_force(ship, &angular) {
                    log::error!("Rejected ship rotation: {}", e);
                }
            }
        }
    }

    fn apply_command(&mut self, command: ConfigCommand) {
        match command {
            ConfigCommand::SetMonitor(index) => self.snapshot.monitor_index = index,
            ConfigCommand::Left => {
                self.snapshot.monitor_index = self.snapshot.monitor_index.saturating_sub(1);
            }
            ConfigCommand::Right => {
                self.snapshot.monitor_index = self.snapshot.monitor_index.saturating_add(1);
            }
            ConfigCommand::SetShip(ship) => self.set_ship(ship),
            ConfigCommand::SetSeed(seed) => self.set_seed(seed),
            ConfigCommand::SetObstacles(obstacles) => self.set_obstacles(obstacles),
            ConfigCommand::SetTargets(targets) => self.set_targets(targets),
            ConfigCommand::ApplyConfig(snapshot) => self.apply_snapshot(snapshot),
        }
    }

    /// Replace seed, ship, obstacles and targets at once
    pub fn apply_snapshot(&mut self, snapshot: SimulationSnapshot) {
        self.snapshot.monitor_index = snapshot.monitor_index;
        if let Some(seed) = snapshot.seed {
            self.set_seed(seed);
        }
        self.set_ship(snapshot.objects.ship);
        self.set_obstacles(snapshot.objects.obstacles);
        self.set_targets(snapshot.objects.targets);
    }

    /// Switch worlds: reseed, drop generated colliders and restart the window
    pub fn set_seed(&mut self, seed: u32) {
        self.snapshot.seed = Some(seed);
        if seed == self.world.seed() {
            return;
        }
        self.world.set_seed(seed);
        for (_, ids) in std::mem::take(&mut self.chunk_colliders) {
            for id in ids {
                self.collisions.remove(id);
            }
        }
        self.window.reset();
    }

    pub fn set_ship(&mut self, ship: ObjectSpec) {
        self.move_ship(Vec3::from_array(ship.position), Vec3::from_array(ship.rotation));
        self.collisions
            .set_bounds(self.ship_entity, Bounds::Sphere { radius: ship.bounding_radius() });
        self.snapshot.objects.ship = ship;
    }

    fn move_ship(&mut self, position: Vec3, hpr: Vec3) {
        self.physics.set_transform(SHIP_HANDLE.into(), position, hpr);
        self.collisions.set_position(self.ship_entity, position);
        self.snapshot.objects.ship.position = position.to_array();
        self.snapshot.objects.ship.rotation = hpr.to_array();
    }

    pub fn set_obstacles(&mut self, obstacles: Vec<ObjectSpec>) {
        for id in self.obstacle_colliders.drain(..) {
            self.collisions.remove(id);
        }
        let ids = obstacles.iter().filter_map(|o| spawn_collider(&mut self.collisions, o)).collect();
        self.obstacle_colliders = ids;
        self.snapshot.objects.obstacles = obstacles;
    }

    pub fn set_targets(&mut self, targets: Vec<ObjectSpec>) {
        for id in self.target_colliders.drain(..) {
            self.collisions.remove(id);
        }
        let ids = targets.iter().filter_map(|t| spawn_collider(&mut self.collisions, t)).collect();
        self.target_colliders = ids;
        self.snapshot.objects.targets = targets;
    }

    /// Start streaming around the ship
    fn build_world(&mut self) {
        if !self.building {
            log::info!("Building world around {}", self.ship_position());
        }
        self.building = true;
    }

    /// Move the streaming window to the ship and materialize what came in.
    ///
    /// Newly generated chunks are announced with one `NEW_OBJECT` per object.
    /// Colliders follow the window: evicted chunks lose theirs, chunks that
    /// re-enter get them back. Returns `None` until the world is being built.
    pub fn stream_world(&mut self) -> Option<WindowUpdate> {
        if !self.building {
            return None;
        }
        let position = self.ship_position();
        let update = self.window.update(self.world.store_mut(), position);

        for coord in &update.evicted {
            for id in self.chunk_colliders.remove(coord).unwrap_or_default() {
                self.collisions.remove(id);
            }
        }

        let mut sink = ChunkSink {
            world: &self.world,
            collisions: &mut self.collisions,
            chunk_colliders: &mut self.chunk_colliders,
            queue: &self.queue,
        };
        self.window.deliver(self.world.store(), &mut sink);

        for coord in &update.entered {
            if self.chunk_colliders.contains_key(coord) {
                continue;
            }
            if let Some(chunk) = self.world.store().get(*coord) {
                let ids = colliders_for_chunk(&self.world, &mut self.collisions, &chunk);
                self.chunk_colliders.insert(*coord, ids);
            }
        }
        Some(update)
    }

    /// One physics tick: drain commands, integrate, run the collision fine
    /// pass and broadcast the ship state.
    pub fn step(&mut self) -> &[CollisionReport] {
        for msg in self.queue.drain_inbound() {
            self.handle_message(msg);
        }

        self.physics.tick();
        for hit in self.physics.collisions() {
            log::debug!("'{}' hit boundary '{}' heading to {}", hit.name, hit.plane, hit.predicted_position);
        }
        self.physics.clear_collisions();

        let position = self.ship_position();
        self.collisions.set_position(self.ship_entity, position);
        if self.pruner.is_none() {
            self.collisions.refresh_proximity();
        }
        let reports = self.collisions.update();
        for report in reports {
            log::debug!("'{}' overlaps '{}' at distance {:.2}", report.actor_name, report.collider_name, report.distance());
        }

        let state = self.ship_state();
        self.snapshot.objects.ship.position = state.pos;
        self.snapshot.objects.ship.rotation = state.rot;
        self.queue.send(Message::UpdateData { ship: state });
        self.collisions.reports()
    }
}

fn spawn_collider(collisions: &mut CollisionWorld, spec: &ObjectSpec) -> Option<EntityId> {
    if !spec.collidable {
        return None;
    }
    let bounds = Bounds::Sphere { radius: spec.bounding_radius() };
    Some(collisions.add_collider(&spec.name, Vec3::from_array(spec.position), bounds))
}

fn colliders_for_chunk(world: &WorldGen, collisions: &mut CollisionWorld, chunk: &ChunkData) -> Vec<EntityId> {
    world
        .materialize(chunk)
        .iter()
        .filter_map(|spec| spawn_collider(collisions, spec))
        .collect()
}

/// Announces freshly generated chunks and gives their objects colliders
struct ChunkSink<'a> {
    world: &'a WorldGen,
    collisions: &'a mut CollisionWorld,
    chunk_colliders: &'a mut BTreeMap<ChunkCoord, Vec<EntityId>>,
    queue: &'a MessageQueue,
}

impl ChunkMaterializer for ChunkSink<'_> {
    fn materialize(&mut self, chunk: &ChunkData, _origin: Vec3) {
        let objects = self.world.materialize(chunk);
        log::debug!("Materializing {} objects for chunk ({}, {})", objects.len(), chunk.coord.x, chunk.coord.y);

        let mut ids = Vec::with_capacity(objects.len());
        for spec in objects {
            ids.extend(spawn_collider(self.collisions, &spec));
            self.queue.send(Message::NewObject(spec));
        }
        // A chunk that was already active keeps its colliders
        if let Some(old) = self.chunk_colliders.insert(chunk.coord, ids) {
            for id in old {
                self.collisions.remove(id);
            }
        }
    }
}
