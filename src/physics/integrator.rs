//! Per-tick rigid-body integration

use crate::core::types::Vec3;

use super::body::{self, BodyRef, RigidBody};
use super::config::PhysicsConfig;
use super::plane::{BoundaryPlane, Orientation, Response};
use super::resolver::{BodyCollision, BoundaryCollisionResolver};
use super::PhysicsError;

/// Callback run for every boundary collision, as it happens
pub type CollisionAction = Box<dyn FnMut(&BodyCollision) + Send>;

/// Integrates velocity, drag and gravity for registered bodies.
///
/// Bodies are addressed through [`BodyRef`]; every operation acts on the first
/// registered body matching the reference. While `updating` is off, force
/// changes and ticks are ignored.
pub struct RigidBodyIntegrator {
    config: PhysicsConfig,
    bodies: Vec<RigidBody>,
    resolver: BoundaryCollisionResolver,
    actions: Vec<CollisionAction>,
    collisions: Vec<BodyCollision>,
    updating: bool,
}

impl RigidBodyIntegrator {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            resolver: BoundaryCollisionResolver::new(),
            actions: Vec::new(),
            collisions: Vec::new(),
            updating: true,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Pause or resume the simulation
    pub fn set_updating(&mut self, updating: bool) {
        self.updating = updating;
    }

    /// Register a body. Several bodies may share a name.
    pub fn register(&mut self, body: RigidBody) {
        log::debug!("Registered body '{}' ({:?})", body.name, body.handle);
        self.bodies.push(body);
    }

    /// Remove the first body matching `target`
    pub fn remove(&mut self, target: BodyRef<'_>) -> Option<RigidBody> {
        let index = self.index_of(target)?;
        Some(self.bodies.remove(index))
    }

    /// Register a boundary plane from its textual configuration.
    ///
    /// Unknown orientation, response or polarity strings are rejected here,
    /// never at collision time.
    pub fn register_plane(
        &mut self,
        handle: body::BodyHandle,
        name: &str,
        position: f32,
        orientation: &str,
        response: &str,
        magnetic_strength: f32,
        magnetic_polarity: &str,
    ) -> Result<(), PhysicsError> {
        let orientation: Orientation = orientation.parse()?;
        let response = Response::parse(response, magnetic_strength, magnetic_polarity)?;
        self.add_plane(BoundaryPlane::new(handle, name, position, orientation, response));
        Ok(())
    }

    pub fn add_plane(&mut self, plane: BoundaryPlane) {
        self.resolver.add_plane(plane);
    }

    /// Remove the first plane matching `target`
    pub fn remove_plane(&mut self, target: BodyRef<'_>) -> Option<BoundaryPlane> {
        self.resolver.remove_plane(target)
    }

    pub fn planes(&self) -> &[BoundaryPlane] {
        self.resolver.planes()
    }

    /// Run `action` for every future boundary collision
    pub fn register_collision_action(&mut self, action: CollisionAction) {
        self.actions.push(action);
    }

    fn index_of(&self, target: BodyRef<'_>) -> Option<usize> {
        self.bodies.iter().position(|b| target.matches(b.handle, &b.name))
    }

    fn find_mut(&mut self, target: BodyRef<'_>) -> Option<&mut RigidBody> {
        let index = self.index_of(target)?;
        self.bodies.get_mut(index)
    }

    pub fn body(&self, target: BodyRef<'_>) -> Option<&RigidBody> {
        self.bodies.iter().find(|b| target.matches(b.handle, &b.name))
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn velocity(&self, target: BodyRef<'_>) -> Option<Vec3> {
        self.body(target).map(|b| b.velocity)
    }

    pub fn angular_velocity(&self, target: BodyRef<'_>) -> Option<Vec3> {
        self.body(target).map(|b| b.angular_velocity)
    }

    /// Set or clear the linear cap of the first matching body
    pub fn set_velocity_cap(&mut self, target: BodyRef<'_>, cap: Option<Vec3>) -> bool {
        self.find_mut(target).map(|b| b.velocity_cap = cap).is_some()
    }

    /// Set or clear the angular cap of the first matching body
    pub fn set_angular_cap(&mut self, target: BodyRef<'_>, cap: Option<Vec3>) -> bool {
        self.find_mut(target).map(|b| b.angular_cap = cap).is_some()
    }

    /// Move a body without touching its velocity
    pub fn set_transform(&mut self, target: BodyRef<'_>, position: Vec3, hpr: Vec3) -> bool {
        self.find_mut(target)
            .map(|b| {
                b.position = position;
                b.orientation = hpr;
            })
            .is_some()
    }

    /// Add a linear force given as an untyped vector.
    ///
    /// A vector that isn't three-dimensional is an error even when no body
    /// matches. Returns whether a body was affected.
    pub fn add_force(&mut self, target: BodyRef<'_>, vector: &[f32]) -> Result<bool, PhysicsError> {
        let force = to_vec3(vector)?;
        Ok(self.apply_force(target, force))
    }

    /// Add an angular force given as an untyped vector
    pub fn add_angular_force(&mut self, target: BodyRef<'_>, vector: &[f32]) -> Result<bool, PhysicsError> {
        let force = to_vec3(vector)?;
        Ok(self.apply_angular_force(target, force))
    }

    /// Add a linear force. Axes already at or above the cap are left alone.
    pub fn apply_force(&mut self, target: BodyRef<'_>, force: Vec3) -> bool {
        if !self.updating {
            return false;
        }
        match self.find_mut(target) {
            Some(b) => {
                body::accumulate(&mut b.velocity, force, b.velocity_cap);
                true
            }
            None => false,
        }
    }

    /// Add an angular force. Axes already at or above the cap are left alone.
    pub fn apply_angular_force(&mut self, target: BodyRef<'_>, force: Vec3) -> bool {
        if !self.updating {
            return false;
        }
        match self.find_mut(target) {
            Some(b) => {
                body::accumulate(&mut b.angular_velocity, force, b.angular_cap);
                true
            }
            None => false,
        }
    }

    /// Zero the linear velocity of the first matching body
    pub fn clear_force(&mut self, target: BodyRef<'_>) -> bool {
        if !self.updating {
            return false;
        }
        self.find_mut(target).map(|b| b.velocity = Vec3::ZERO).is_some()
    }

    /// Zero the angular velocity of the first matching body
    pub fn clear_angular_force(&mut self, target: BodyRef<'_>) -> bool {
        if !self.updating {
            return false;
        }
        self.find_mut(target).map(|b| b.angular_velocity = Vec3::ZERO).is_some()
    }

    /// Collisions recorded since the last [`clear_collisions`](Self::clear_collisions)
    pub fn collisions(&self) -> &[BodyCollision] {
        &self.collisions
    }

    pub fn clear_collisions(&mut self) {
        self.collisions.clear();
    }

    /// Advance every body by one step.
    ///
    /// Per body: linear drag, gravity, rotational drag, boundary planes, then
    /// position += velocity and orientation += angular velocity.
    pub fn tick(&mut self) {
        if !self.updating {
            return;
        }

        let config = &self.config;
        for rb in &mut self.bodies {
            body::apply_drag(&mut rb.velocity, config.drag);
            rb.velocity += config.gravity;
            body::apply_drag(&mut rb.angular_velocity, config.rotational_drag);

            if !self.resolver.is_empty() {
                let first_new = self.collisions.len();
                self.resolver.resolve(rb, &mut self.collisions);
                for collision in &self.collisions[first_new..] {
                    for action in &mut self.actions {
                        action(collision);
                    }
                }
            }

            rb.position += rb.velocity;
            rb.orientation += rb.angular_velocity;
        }
    }
}

fn to_vec3(vector: &[f32]) -> Result<Vec3, PhysicsError> {
    match *vector {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(PhysicsError::DimensionMismatch { expected: 3, got: vector.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::BodyHandle;
    use std::sync::{Arc, Mutex};

    fn frictionless() -> RigidBodyIntegrator {
        RigidBodyIntegrator::new(PhysicsConfig::frictionless())
    }

    #[test]
    fn test_drag_floors_at_zero() {
        let mut physics = RigidBodyIntegrator::new(PhysicsConfig {
            drag: 0.1,
            gravity: Vec3::ZERO,
            rotational_drag: 0.0,
        });
        physics.register(RigidBody::new(BodyHandle(1), "drone").with_velocity(Vec3::new(0.5, 0.0, 0.0)));

        for _ in 0..4 {
            physics.tick();
            assert!(physics.velocity(BodyRef::name("drone")).unwrap().x > 0.0);
        }
        physics.tick();
        assert_eq!(physics.velocity(BodyRef::name("drone")).unwrap().x, 0.0);
        physics.tick();
        assert_eq!(physics.velocity(BodyRef::name("drone")).unwrap().x, 0.0);
    }

    #[test]
    fn test_rebound_off_positive_plane() {
        let mut physics = frictionless();
        physics.register(
            RigidBody::new(BodyHandle(1), "ship")
                .with_position(Vec3::new(9.5, 0.0, 0.0))
                .with_velocity(Vec3::new(1.0, 0.0, 0.0)),
        );
        physics
            .register_plane(BodyHandle(50), "wall", 10.0, "+x", "rebound", 1.0, "+")
            .unwrap();

        physics.tick();

        assert_eq!(physics.velocity(BodyRef::name("ship")).unwrap().x, -1.0);
        assert_eq!(physics.collisions().len(), 1);
        assert_eq!(physics.collisions()[0].predicted_position, Vec3::new(8.5, 0.0, 0.0));
        assert_eq!(physics.body(BodyRef::name("ship")).unwrap().position.x, 8.5);

        physics.clear_collisions();
        assert!(physics.collisions().is_empty());
    }

    #[test]
    fn test_damp_and_stop() {
        let mut physics = frictionless();
        physics.register(
            RigidBody::new(BodyHandle(1), "a")
                .with_position(Vec3::new(0.0, 0.0, 1.0))
                .with_velocity(Vec3::new(0.0, 0.0, -2.0)),
        );
        physics.register_plane(BodyHandle(9), "floor", 0.0, "-z", "damp", 1.0, "+").unwrap();
        physics.tick();
        assert_eq!(physics.velocity(BodyHandle(1).into()).unwrap().z, 1.0);

        physics.remove_plane(BodyRef::name("floor")).unwrap();
        physics.register_plane(BodyHandle(9), "ceiling", 2.0, "+z", "stop", 1.0, "+").unwrap();
        physics.tick();
        assert_eq!(physics.velocity(BodyHandle(1).into()).unwrap().z, 0.0);
    }

    #[test]
    fn test_magnetic_repels() {
        let mut physics = frictionless();
        physics.register(RigidBody::new(BodyHandle(1), "a").with_velocity(Vec3::new(0.0, 1.0, 0.0)));
        physics.register_plane(BodyHandle(9), "field", 0.5, "+y", "magnetic", 0.25, "+").unwrap();
        physics.tick();
        assert_eq!(physics.velocity(BodyHandle(1).into()).unwrap().y, 0.75);
    }

    #[test]
    fn test_bad_plane_config_rejected() {
        let mut physics = frictionless();
        assert!(matches!(
            physics.register_plane(BodyHandle(9), "p", 0.0, "up", "stop", 1.0, "+"),
            Err(PhysicsError::UnknownOrientation(_))
        ));
        assert!(matches!(
            physics.register_plane(BodyHandle(9), "p", 0.0, "+x", "explode", 1.0, "+"),
            Err(PhysicsError::UnknownResponse(_))
        ));
        assert!(physics.planes().is_empty());
    }

    #[test]
    fn test_force_respects_cap() {
        let mut physics = frictionless();
        physics.register(RigidBody::new(BodyHandle(1), "ship").with_velocity_cap(Vec3::splat(1.0)));

        for _ in 0..5 {
            physics.add_force(BodyRef::name("ship"), &[0.4, 0.0, -0.4]).unwrap();
        }
        // Accumulates while below the cap, then freezes
        let v = physics.velocity(BodyRef::name("ship")).unwrap();
        assert!((v.x - 1.2).abs() < 1e-6);
        assert!((v.z + 1.2).abs() < 1e-6);

        physics.set_velocity_cap(BodyRef::name("ship"), None);
        physics.add_force(BodyRef::name("ship"), &[1.0, 0.0, 0.0]).unwrap();
        assert!((physics.velocity(BodyRef::name("ship")).unwrap().x - 2.2).abs() < 1e-6);
    }

    #[test]
    fn test_force_dimension_mismatch() {
        let mut physics = frictionless();
        physics.register(RigidBody::new(BodyHandle(1), "ship"));

        assert_eq!(
            physics.add_force(BodyRef::name("ship"), &[1.0, 2.0]),
            Err(PhysicsError::DimensionMismatch { expected: 3, got: 2 })
        );
        assert!(physics.add_angular_force(BodyRef::name("ship"), &[1.0; 4]).is_err());
        assert_eq!(physics.velocity(BodyRef::name("ship")), Some(Vec3::ZERO));
    }

    #[test]
    fn test_first_match_wins() {
        let mut physics = frictionless();
        physics.register(RigidBody::new(BodyHandle(1), "twin"));
        physics.register(RigidBody::new(BodyHandle(2), "twin"));

        assert!(physics.apply_force(BodyRef::name("twin"), Vec3::X));
        assert_eq!(physics.velocity(BodyHandle(1).into()), Some(Vec3::X));
        assert_eq!(physics.velocity(BodyHandle(2).into()), Some(Vec3::ZERO));

        // Handle match on the second body still loses to a name match on the first
        assert!(physics.apply_force(BodyRef::either(BodyHandle(2), "twin"), Vec3::Y));
        assert_eq!(physics.velocity(BodyHandle(1).into()), Some(Vec3::new(1.0, 1.0, 0.0)));

        assert_eq!(physics.remove(BodyRef::name("twin")).unwrap().handle, BodyHandle(1));
        assert_eq!(physics.bodies().len(), 1);
        assert!(!physics.apply_force(BodyRef::name("ghost"), Vec3::X));
    }

    #[test]
    fn test_angular_motion() {
        let mut physics = frictionless();
        physics.register(RigidBody::new(BodyHandle(1), "ship").with_angular_cap(Vec3::splat(5.0)));
        physics.add_angular_force(BodyRef::name("ship"), &[2.0, 0.0, 0.0]).unwrap();
        physics.tick();
        physics.tick();

        let ship = physics.body(BodyRef::name("ship")).unwrap();
        assert_eq!(ship.orientation, Vec3::new(4.0, 0.0, 0.0));
        physics.clear_angular_force(BodyRef::name("ship"));
        assert_eq!(physics.angular_velocity(BodyRef::name("ship")), Some(Vec3::ZERO));
    }

    #[test]
    fn test_gravity_moves_bodies() {
        let mut physics = RigidBodyIntegrator::new(PhysicsConfig::default());
        physics.register(RigidBody::new(BodyHandle(1), "rock"));
        physics.tick();
        let rock = physics.body(BodyRef::name("rock")).unwrap();
        assert!((rock.velocity.z + 0.098).abs() < 1e-6);
        assert!((rock.position.z + 0.098).abs() < 1e-6);
    }

    #[test]
    fn test_paused_ignores_everything() {
        let mut physics = frictionless();
        physics.register(RigidBody::new(BodyHandle(1), "ship").with_velocity(Vec3::X));
        physics.set_updating(false);

        assert!(!physics.apply_force(BodyRef::name("ship"), Vec3::Y));
        assert!(!physics.clear_force(BodyRef::name("ship")));
        physics.tick();

        let ship = physics.body(BodyRef::name("ship")).unwrap();
        assert_eq!(ship.position, Vec3::ZERO);
        assert_eq!(ship.velocity, Vec3::X);
    }

    #[test]
    fn test_collision_actions_run() {
        let mut physics = frictionless();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        physics.register_collision_action(Box::new(move |c: &BodyCollision| {
            sink.lock().unwrap().push(c.name.clone());
        }));
        physics.register(RigidBody::new(BodyHandle(1), "ship").with_velocity(Vec3::X));
        physics.register_plane(BodyHandle(9), "wall", 0.5, "+x", "stop", 1.0, "+").unwrap();

        physics.tick();
        assert_eq!(*seen.lock().unwrap(), vec!["ship".to_string()]);
    }
}
