use crate::{BodyPart, VibrationSample};
use serde::{Deserialize, Serialize};

/// Snapshot published once per control cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelecontrolTelemetry {
    pub body_parts: Vec<BodyPartTelemetry>,

    /// Vibration sample currently driven on the glove
    pub vibration: VibrationSample,

    /// Timestamp in milliseconds since Unix epoch
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyPartTelemetry {
    pub body_part: BodyPart,
    pub direct: bool,

    /// False when the part is activated but its device never came up
    pub connected: bool,

    /// Angles of the last whole-part command, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commanded: Option<Vec<f64>>,

    /// Encoder readings, absent when the device could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoders: Option<Vec<f64>>,
}

impl TelecontrolTelemetry {
    pub fn new(vibration: VibrationSample) -> Self {
        Self {
            body_parts: Vec::new(),
            vibration,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
        }
    }

    pub fn part(&self, body_part: BodyPart) -> Option<&BodyPartTelemetry> {
        self.body_parts.iter().find(|p| p.body_part == body_part)
    }
}
