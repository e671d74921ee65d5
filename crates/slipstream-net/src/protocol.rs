//! Wire protocol - tagged JSON message and payload definitions

use serde::{Deserialize, Serialize};

use crate::NetError;

/// Messages exchanged between the flight server and its clients.
///
/// Encoded as `{"tag": "NEW_OBJECT", "payload": {...}}`; tags without a
/// payload omit the `payload` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Client announces itself and asks for configuration
    ClientInit,
    /// Client reports a named piece of local information (monitor index, seed...)
    ClientInfo { key: String, value: serde_json::Value },
    /// Client finished configuration
    ClientReady,
    /// Periodic ship state update
    UpdateData { ship: ShipState },
    /// An object came into existence (materialized chunk object, placed obstacle)
    NewObject(ObjectSpec),
    /// Configuration command for the simulation
    ClientConfig(ConfigCommand),
    /// Begin building the world around the ship
    BuildWorld,
    /// Begin ticking physics
    StartSimulation,
    /// Thrust applied to the ship by an external controller.
    ///
    /// Vectors stay untyped on the wire; their length is checked when applied.
    ShipThrust { linear: Vec<f32>, angular: Vec<f32> },
}

impl Message {
    /// Encode as a single JSON line (without the trailing newline)
    pub fn encode(&self) -> Result<String, NetError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a single JSON line
    pub fn decode(line: &str) -> Result<Self, NetError> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

/// Configuration commands carried by [`Message::ClientConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum ConfigCommand {
    SetMonitor(u32),
    SetShip(ObjectSpec),
    SetSeed(u32),
    SetObstacles(Vec<ObjectSpec>),
    SetTargets(Vec<ObjectSpec>),
    /// Replace everything at once with a saved snapshot
    ApplyConfig(SimulationSnapshot),
    /// Move the client window one monitor left
    Left,
    /// Move the client window one monitor right
    Right,
}

/// Ship position and heading/pitch/roll
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    pub pos: [f32; 3],
    pub rot: [f32; 3],
}

/// Description of a world object: ship, obstacle, target or generated body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "one3")]
    pub size: [f32; 3],
    #[serde(default = "one3")]
    pub hitbox_scale: [f32; 3],
    #[serde(default)]
    pub hitbox_offset: [f32; 3],
    #[serde(default)]
    pub hitbox_type: Option<String>,
    #[serde(default = "one4")]
    pub color: [f32; 4],
    #[serde(rename = "colorScale", default = "one4")]
    pub color_scale: [f32; 4],
    /// Object category ("ship", "obstacle", "target", or a generated kind)
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(rename = "colidable", alias = "collidable", default = "yes")]
    pub collidable: bool,
    /// Placed by an operator rather than generated
    #[serde(rename = "customSetType", default, skip_serializing_if = "std::ops::Not::not")]
    pub custom_set_type: bool,
}

fn one3() -> [f32; 3] {
    [1.0; 3]
}

fn one4() -> [f32; 4] {
    [1.0; 4]
}

fn yes() -> bool {
    true
}

impl Default for ObjectSpec {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            size: one3(),
            hitbox_scale: one3(),
            hitbox_offset: [0.0; 3],
            hitbox_type: None,
            color: one4(),
            color_scale: one4(),
            id: "obstacle".into(),
            name: "name".into(),
            visible: true,
            collidable: true,
            custom_set_type: false,
        }
    }
}

impl ObjectSpec {
    /// Create an object of the given category and name at a position
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: [f32; 3]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            ..Default::default()
        }
    }

    /// The default player ship
    pub fn ship() -> Self {
        Self {
            hitbox_type: Some("box".into()),
            color: [1.0, 0.0, 0.0, 1.0],
            ..Self::new("ship", "ship", [0.0; 3])
        }
    }

    /// Bounding radius used when this object becomes a sphere collider
    pub fn bounding_radius(&self) -> f32 {
        let half = |i: usize| self.size[i] * self.hitbox_scale[i] * 0.5;
        half(0).max(half(1)).max(half(2))
    }
}

/// Persisted simulation state for a named save slot.
///
/// Field names follow the slot file format (`MONITOR_INDEX`, `SEED`, `OBJECTS`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    #[serde(rename = "MONITOR_INDEX", default)]
    pub monitor_index: u32,
    #[serde(rename = "SEED", default)]
    pub seed: Option<u32>,
    #[serde(rename = "OBJECTS", default)]
    pub objects: SnapshotObjects,
}

impl Default for SimulationSnapshot {
    fn default() -> Self {
        Self {
            monitor_index: 0,
            seed: None,
            objects: SnapshotObjects::default(),
        }
    }
}

/// Objects section of a [`SimulationSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotObjects {
    #[serde(rename = "SHIP", default = "ObjectSpec::ship")]
    pub ship: ObjectSpec,
    #[serde(rename = "OBSTACLES", default)]
    pub obstacles: Vec<ObjectSpec>,
    #[serde(rename = "TARGETS", default)]
    pub targets: Vec<ObjectSpec>,
}

impl Default for SnapshotObjects {
    fn default() -> Self {
        Self {
            ship: ObjectSpec::ship(),
            obstacles: Vec::new(),
            targets: Vec::new(),
        }
    }
}

impl From<ShipState> for ObjectSpec {
    fn from(state: ShipState) -> Self {
        Self {
            position: state.pos,
            rotation: state.rot,
            ..Self::ship()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_message_has_no_payload() {
        let json = Message::ClientReady.encode().unwrap();
        assert_eq!(json, r#"{"tag":"CLIENT_READY"}"#);
        assert_eq!(Message::decode(&json).unwrap(), Message::ClientReady);
    }

    #[test]
    fn test_new_object_wire_shape() {
        let msg = Message::NewObject(ObjectSpec::new("nebula", "nebula_3", [1.0, 2.0, 3.0]));
        let value: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();

        assert_eq!(value["tag"], "NEW_OBJECT");
        assert_eq!(value["payload"]["id"], "nebula");
        assert_eq!(value["payload"]["position"][2], 3.0);
        assert_eq!(value["payload"]["colorScale"][3], 1.0);
        assert_eq!(value["payload"]["colidable"], true);
        // Generated objects don't carry the operator flag
        assert!(value["payload"].get("customSetType").is_none());
    }

    #[test]
    fn test_object_spec_fills_defaults() {
        let spec: ObjectSpec = serde_json::from_str(
            r#"{"id": "target", "position": [5, 0, 0], "customSetType": true}"#,
        )
        .unwrap();

        assert_eq!(spec.size, [1.0; 3]);
        assert_eq!(spec.color_scale, [1.0; 4]);
        assert!(spec.visible);
        assert!(spec.collidable);
        assert!(spec.custom_set_type);
    }

    #[test]
    fn test_config_command_encoding() {
        let msg = Message::ClientConfig(ConfigCommand::SetSeed(42));
        let json = msg.encode().unwrap();
        assert_eq!(
            json,
            r#"{"tag":"CLIENT_CONFIG","payload":{"command":"set_seed","value":42}}"#
        );
        assert_eq!(Message::decode(&json).unwrap(), msg);
    }

    #[test]
    fn test_snapshot_field_names() {
        let snapshot = SimulationSnapshot {
            monitor_index: 1,
            seed: Some(99),
            ..Default::default()
        };
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["MONITOR_INDEX"], 1);
        assert_eq!(value["SEED"], 99);
        assert_eq!(value["OBJECTS"]["SHIP"]["id"], "ship");
        assert!(value["OBJECTS"]["OBSTACLES"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        assert!(Message::decode(r#"{"tag":"SELF_DESTRUCT"}"#).is_err());
    }

    #[test]
    fn test_bounding_radius_uses_largest_axis() {
        let spec = ObjectSpec {
            size: [2.0, 6.0, 4.0],
            ..Default::default()
        };
        assert_eq!(spec.bounding_radius(), 3.0);
    }
}
