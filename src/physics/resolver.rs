//! Collision response against boundary planes

use crate::core::types::Vec3;

use super::body::{BodyHandle, BodyRef, RigidBody};
use super::plane::BoundaryPlane;

/// One body crossing one plane during a tick
#[derive(Debug, Clone, PartialEq)]
pub struct BodyCollision {
    pub handle: BodyHandle,
    pub name: String,
    /// Name of the plane that was crossed
    pub plane: String,
    /// Where the body is headed after the response was applied
    pub predicted_position: Vec3,
}

/// Holds the registered boundary planes and applies their responses.
#[derive(Debug, Default)]
pub struct BoundaryCollisionResolver {
    planes: Vec<BoundaryPlane>,
}

impl BoundaryCollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_plane(&mut self, plane: BoundaryPlane) {
        self.planes.push(plane);
    }

    /// Remove the first plane matching `target`
    pub fn remove_plane(&mut self, target: BodyRef<'_>) -> Option<BoundaryPlane> {
        let index = self.planes.iter().position(|p| target.matches(p.handle, &p.name))?;
        Some(self.planes.remove(index))
    }

    pub fn planes(&self) -> &[BoundaryPlane] {
        &self.planes
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Check `body`'s next position against every plane in registration order.
    ///
    /// Each crossing adjusts only the velocity component on that plane's axis,
    /// so planes on different axes constrain a body independently within one
    /// tick. Later planes see the velocity earlier planes produced.
    pub fn resolve(&self, body: &mut RigidBody, collisions: &mut Vec<BodyCollision>) {
        for plane in &self.planes {
            let axis = plane.orientation.axis.index();
            let next = body.position[axis] + body.velocity[axis];
            if !plane.orientation.crosses(next, plane.position) {
                continue;
            }

            body.velocity[axis] = plane.response.apply(body.velocity[axis], plane.orientation);
            collisions.push(BodyCollision {
                handle: body.handle,
                name: body.name.clone(),
                plane: plane.name.clone(),
                predicted_position: body.predicted_position(),
            });
        }
    }
}
