//! Detected overlaps

use crate::core::types::Vec3;

use super::entity::EntityId;

/// One actor/collider overlap found by a fine pass.
///
/// Positions are captured at detection time; the report does not follow the
/// entities afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionReport {
    pub actor: EntityId,
    pub actor_name: String,
    pub collider: EntityId,
    pub collider_name: String,
    pub actor_position: Vec3,
    pub collider_position: Vec3,
}

impl CollisionReport {
    /// Distance between the two centers at detection time
    pub fn distance(&self) -> f32 {
        self.actor_position.distance(self.collider_position)
    }
}
