//! Axis-aligned boundary planes

use std::fmt;
use std::str::FromStr;

use super::PhysicsError;
use super::body::BodyHandle;

/// World axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Which side of a plane is blocked.
///
/// A `+x` plane stops travel toward `+x`: a body collides when its next x
/// would reach or pass the plane from below. A `-x` plane mirrors that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Orientation {
    pub axis: Axis,
    pub positive: bool,
}

impl Orientation {
    pub const POS_X: Orientation = Orientation { axis: Axis::X, positive: true };
    pub const NEG_X: Orientation = Orientation { axis: Axis::X, positive: false };
    pub const POS_Y: Orientation = Orientation { axis: Axis::Y, positive: true };
    pub const NEG_Y: Orientation = Orientation { axis: Axis::Y, positive: false };
    pub const POS_Z: Orientation = Orientation { axis: Axis::Z, positive: true };
    pub const NEG_Z: Orientation = Orientation { axis: Axis::Z, positive: false };

    /// +1 for positive orientations, -1 otherwise
    pub fn sign(self) -> f32 {
        if self.positive { 1.0 } else { -1.0 }
    }

    /// Whether a coordinate along the axis is at or past a plane at `plane`
    pub fn crosses(self, next: f32, plane: f32) -> bool {
        if self.positive { next >= plane } else { next <= plane }
    }
}

impl FromStr for Orientation {
    type Err = PhysicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sign, axis) = s.trim().split_at_checked(1)
            .ok_or_else(|| PhysicsError::UnknownOrientation(s.to_string()))?;
        let positive = match sign {
            "+" => true,
            "-" => false,
            _ => return Err(PhysicsError::UnknownOrientation(s.to_string())),
        };
        let axis = match axis.to_ascii_lowercase().as_str() {
            "x" => Axis::X,
            "y" => Axis::Y,
            "z" => Axis::Z,
            _ => return Err(PhysicsError::UnknownOrientation(s.to_string())),
        };
        Ok(Self { axis, positive })
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self.axis {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        };
        write!(f, "{}{}", if self.positive { '+' } else { '-' }, axis)
    }
}

/// Magnetic plane polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// `+`: pushes bodies back from the plane
    Repel,
    /// `-`: pulls bodies through toward the blocked side
    Attract,
}

impl FromStr for Polarity {
    type Err = PhysicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Polarity::Repel),
            "-" => Ok(Polarity::Attract),
            _ => Err(PhysicsError::UnknownPolarity(s.to_string())),
        }
    }
}

/// What happens to the crossing velocity component
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    /// Negate
    Rebound,
    /// Negate and halve
    Damp,
    /// Zero
    Stop,
    /// Add `strength` along the axis, away from the plane or toward it
    Magnetic { strength: f32, polarity: Polarity },
}

impl Response {
    /// Parse a response name. `strength` and `polarity` only apply to `magnetic`
    /// but the polarity is validated regardless.
    pub fn parse(name: &str, strength: f32, polarity: &str) -> Result<Self, PhysicsError> {
        let polarity: Polarity = polarity.parse()?;
        match name.trim().to_ascii_lowercase().as_str() {
            "rebound" => Ok(Response::Rebound),
            "damp" => Ok(Response::Damp),
            "stop" => Ok(Response::Stop),
            "magnetic" => Ok(Response::Magnetic { strength, polarity }),
            _ => Err(PhysicsError::UnknownResponse(name.to_string())),
        }
    }

    /// New velocity component after a crossing
    pub fn apply(self, component: f32, orientation: Orientation) -> f32 {
        match self {
            Response::Rebound => -component,
            Response::Damp => -0.5 * component,
            Response::Stop => 0.0,
            Response::Magnetic { strength, polarity: Polarity::Repel } => {
                component - orientation.sign() * strength
            }
            Response::Magnetic { strength, polarity: Polarity::Attract } => {
                component + orientation.sign() * strength
            }
        }
    }
}

/// An infinite axis-aligned plane constraining every registered body
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPlane {
    pub handle: BodyHandle,
    pub name: String,
    /// Plane coordinate along its axis
    pub position: f32,
    pub orientation: Orientation,
    pub response: Response,
}

impl BoundaryPlane {
    pub fn new(
        handle: BodyHandle,
        name: impl Into<String>,
        position: f32,
        orientation: Orientation,
        response: Response,
    ) -> Self {
        Self { handle, name: name.into(), position, orientation, response }
    }
}
