//! Registered bodies and how callers address them

use crate::core::types::Vec3;

/// Opaque handle of the scene object a body drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

/// Addresses a registered body or plane by handle, by name, or by either.
///
/// An entry matches when its handle equals `handle` or its name equals
/// `name`. Names need not be unique; operations act on the first entry in
/// registration order that matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyRef<'a> {
    pub handle: Option<BodyHandle>,
    pub name: Option<&'a str>,
}

impl<'a> BodyRef<'a> {
    pub fn handle(handle: BodyHandle) -> Self {
        Self { handle: Some(handle), name: None }
    }

    pub fn name(name: &'a str) -> Self {
        Self { handle: None, name: Some(name) }
    }

    pub fn either(handle: BodyHandle, name: &'a str) -> Self {
        Self { handle: Some(handle), name: Some(name) }
    }

    pub fn matches(&self, handle: BodyHandle, name: &str) -> bool {
        self.handle == Some(handle) || self.name == Some(name)
    }
}

impl From<BodyHandle> for BodyRef<'_> {
    fn from(handle: BodyHandle) -> Self {
        Self::handle(handle)
    }
}

impl<'a> From<&'a str> for BodyRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::name(name)
    }
}

/// A body advanced by the integrator
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub handle: BodyHandle,
    pub name: String,
    pub position: Vec3,
    /// Heading, pitch, roll in degrees
    pub orientation: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Per-axis magnitude above which linear forces stop accumulating
    pub velocity_cap: Option<Vec3>,
    /// Per-axis magnitude above which angular forces stop accumulating
    pub angular_cap: Option<Vec3>,
}

impl RigidBody {
    pub fn new(handle: BodyHandle, name: impl Into<String>) -> Self {
        Self {
            handle,
            name: name.into(),
            position: Vec3::ZERO,
            orientation: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            velocity_cap: None,
            angular_cap: None,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, hpr: Vec3) -> Self {
        self.orientation = hpr;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_velocity_cap(mut self, cap: Vec3) -> Self {
        self.velocity_cap = Some(cap);
        self
    }

    pub fn with_angular_cap(mut self, cap: Vec3) -> Self {
        self.angular_cap = Some(cap);
        self
    }

    /// Position after one step at the current velocity
    pub fn predicted_position(&self) -> Vec3 {
        self.position + self.velocity
    }
}

/// Add `force` to `velocity` on every axis whose magnitude is still below the cap
pub(crate) fn accumulate(velocity: &mut Vec3, force: Vec3, cap: Option<Vec3>) {
    match cap {
        None => *velocity += force,
        Some(cap) => {
            for i in 0..3 {
                if velocity[i].abs() < cap[i].abs() {
                    velocity[i] += force[i];
                }
            }
        }
    }
}

/// Shrink every component toward zero by `drag`, snapping to zero instead of
/// crossing it
pub(crate) fn apply_drag(velocity: &mut Vec3, drag: f32) {
    // Float slack: repeated subtraction must land on zero, not a sliver past it
    const SNAP_EPSILON: f32 = 1e-6;
    if drag <= 0.0 {
        return;
    }
    for i in 0..3 {
        let v = velocity[i];
        velocity[i] = if v.abs() > drag + SNAP_EPSILON {
            v - drag * v.signum()
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_matches_handle_or_name() {
        let r = BodyRef::either(BodyHandle(1), "ship");
        assert!(r.matches(BodyHandle(1), "other"));
        assert!(r.matches(BodyHandle(2), "ship"));
        assert!(!r.matches(BodyHandle(2), "other"));
        assert!(!BodyRef::name("ship").matches(BodyHandle(1), "drone"));
    }

    #[test]
    fn test_accumulate_freezes_capped_axes() {
        let mut v = Vec3::new(2.0, 0.5, -3.0);
        accumulate(&mut v, Vec3::ONE, Some(Vec3::new(2.0, 1.0, -3.0)));
        assert_eq!(v, Vec3::new(2.0, 1.5, -3.0));
    }

    #[test]
    fn test_drag_never_crosses_zero() {
        let mut v = Vec3::new(0.05, -0.05, 1.0);
        apply_drag(&mut v, 0.1);
        assert_eq!(v.x, 0.0);
        assert_eq!(v.y, 0.0);
        assert!((v.z - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_zero_drag_keeps_tiny_velocities() {
        let mut v = Vec3::new(1e-7, -5e-7, 0.0);
        apply_drag(&mut v, 0.0);
        assert_eq!(v, Vec3::new(1e-7, -5e-7, 0.0));
    }
}
