//! Actors and colliders

use std::fmt;
use std::sync::Arc;

use crate::core::types::Vec3;

use super::mesh::TriangleMesh;
use super::report::CollisionReport;

/// Identifier of a registered actor or collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Side of the actor/collider check an entity is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Checked against nearby colliders (ships, drones)
    Actor,
    /// Checked against nearby actors (obstacles, generated bodies)
    Collider,
}

impl Role {
    pub fn opposite(self) -> Role {
        match self {
            Role::Actor => Role::Collider,
            Role::Collider => Role::Actor,
        }
    }
}

/// Bounding representation of an entity
#[derive(Debug, Clone)]
pub enum Bounds {
    /// Sphere approximation
    Sphere { radius: f32 },
    /// Convex hull of a point cloud, in entity-local coordinates
    Mesh(Arc<TriangleMesh>),
}

impl Bounds {
    /// Radius of the sphere proxy used for distance checks
    pub fn radius(&self) -> f32 {
        match self {
            Bounds::Sphere { radius } => *radius,
            Bounds::Mesh(mesh) => mesh.bounding_radius(),
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self, Bounds::Mesh(_))
    }
}

/// Live source of an entity's world position, e.g. a scene node
pub trait PositionSource: Send + Sync {
    fn position(&self) -> Vec3;
}

impl<F> PositionSource for F
where
    F: Fn() -> Vec3 + Send + Sync,
{
    fn position(&self) -> Vec3 {
        self()
    }
}

/// An actor or collider with the reports attached to it this frame
#[derive(Clone)]
pub struct CollisionEntity {
    pub id: EntityId,
    pub name: String,
    pub role: Role,
    pub position: Vec3,
    pub bounds: Bounds,
    pub(crate) source: Option<Arc<dyn PositionSource>>,
    pub(crate) reports: Vec<CollisionReport>,
}

impl CollisionEntity {
    pub fn new(id: EntityId, name: impl Into<String>, role: Role, position: Vec3, bounds: Bounds) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            position,
            bounds,
            source: None,
            reports: Vec::new(),
        }
    }

    pub fn radius(&self) -> f32 {
        self.bounds.radius()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Reports involving this entity from the latest fine pass
    pub fn reports(&self) -> &[CollisionReport] {
        &self.reports
    }

    /// Pull the position from the live source, if any
    pub(crate) fn refresh_position(&mut self) {
        if let Some(source) = &self.source {
            self.position = source.position();
        }
    }
}

impl fmt::Debug for CollisionEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionEntity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("position", &self.position)
            .field("bounds", &self.bounds)
            .field("has_source", &self.source.is_some())
            .field("reports", &self.reports.len())
            .finish()
    }
}
