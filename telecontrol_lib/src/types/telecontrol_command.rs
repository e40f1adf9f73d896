use crate::{BodyPart, JointVelocityProfile};
use serde::{Deserialize, Serialize};

/// Command sent to the telecontrol node by the glove mapping stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelecontrolCommand {
    /// Start (`finished = false`) or end (`finished = true`) a movement phase.
    SetControlMode { finished: bool },
    SetVelocity { profile: JointVelocityProfile },
    MoveJoint {
        body_part: BodyPart,
        joint_id: usize,
        angle: f64,
    },
    MoveBodyPart {
        body_part: BodyPart,
        angles: Vec<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelecontrolCommandWithMetadata {
    pub command: Option<TelecontrolCommand>,
    #[serde(default)]
    pub metadata: CommandMetadata,
}

/// Producers may omit any field; missing ids and timestamps are assigned on
/// arrival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMetadata {
    #[serde(default = "new_command_id")]
    pub command_id: String,
    /// Milliseconds since Unix epoch
    #[serde(default = "now_millis")]
    pub timestamp: u64,
    #[serde(default)]
    pub source: InputSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputSource {
    #[default]
    Glove,
    Keyboard,
}

fn new_command_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

impl Default for CommandMetadata {
    fn default() -> Self {
        Self {
            command_id: new_command_id(),
            timestamp: now_millis(),
            source: InputSource::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let json = r#"{
            "command": {"type": "move_body_part", "body_part": "torso", "angles": [1.0, -2.5, 0.0]},
            "metadata": {"command_id": "abc", "timestamp": 12, "source": "Glove"}
        }"#;

        let parsed: TelecontrolCommandWithMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.command,
            Some(TelecontrolCommand::MoveBodyPart {
                body_part: BodyPart::Torso,
                angles: vec![1.0, -2.5, 0.0],
            })
        );
        assert_eq!(parsed.metadata.source, InputSource::Glove);
    }

    #[test]
    fn test_velocity_command_wire_format() {
        let command = TelecontrolCommand::SetVelocity {
            profile: JointVelocityProfile::Low,
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["type"], "set_velocity");
        assert_eq!(json["profile"], "low");
    }

    #[test]
    fn test_missing_metadata_is_assigned() {
        let json = r#"{"command": {"type": "set_control_mode", "finished": true}}"#;

        let a: TelecontrolCommandWithMetadata = serde_json::from_str(json).unwrap();
        let b: TelecontrolCommandWithMetadata = serde_json::from_str(json).unwrap();
        assert_ne!(a.metadata.command_id, b.metadata.command_id);
        assert!(a.metadata.timestamp > 0);
        assert_eq!(a.metadata.source, InputSource::Glove);
        assert_eq!(
            a.command,
            Some(TelecontrolCommand::SetControlMode { finished: true })
        );
    }

    #[test]
    fn test_partial_metadata_keeps_given_fields() {
        let json = r#"{
            "command": {"type": "move_joint", "body_part": "head", "joint_id": 1, "angle": 7.5},
            "metadata": {"source": "Keyboard"}
        }"#;

        let parsed: TelecontrolCommandWithMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.metadata.source, InputSource::Keyboard);
        assert!(!parsed.metadata.command_id.is_empty());
    }
}
