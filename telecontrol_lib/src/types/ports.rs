//! Dataflow input/output ids used by the telecontrol node and the in-process
//! outbox that collects outbound messages until the node flushes them.

use eyre::{Result, WrapErr};
use serde::Serialize;
use std::sync::mpsc::{self, Receiver, Sender};

pub const TICK_INPUT: &str = "tick";
pub const VIBRATION_INPUT: &str = "vibration";
pub const GLOVE_SENSORS_INPUT: &str = "glove_sensors";
pub const COMMAND_INPUT: &str = "telecontrol_command";
pub const ENCODERS_INPUT: &str = "encoders";

pub const GLOVE_RAW_OUTPUT: &str = "glove_raw";
pub const GLOVE_VIBRATION_OUTPUT: &str = "glove_vibration";
pub const DEVICE_REQUEST_OUTPUT: &str = "device_request";
pub const TELEMETRY_OUTPUT: &str = "telemetry";

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundPayload {
    /// Sent as a Float64Array
    Values(Vec<f64>),
    /// Sent as a single-element BinaryArray
    Json(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub output: &'static str,
    pub payload: OutboundPayload,
}

#[derive(Debug, Clone)]
pub struct Outbox {
    sender: Sender<OutboundMessage>,
}

/// Create an outbox and the receiver the node drains after every event.
pub fn outbox() -> (Outbox, Receiver<OutboundMessage>) {
    let (sender, receiver) = mpsc::channel();
    (Outbox { sender }, receiver)
}

impl Outbox {
    pub fn send_values(&self, output: &'static str, values: Vec<f64>) -> Result<()> {
        self.send(OutboundMessage {
            output,
            payload: OutboundPayload::Values(values),
        })
    }

    pub fn send_json<T: Serialize>(&self, output: &'static str, message: &T) -> Result<()> {
        let bytes = serde_json::to_vec(message)
            .wrap_err_with(|| format!("Failed to serialize message for '{}'", output))?;
        self.send(OutboundMessage {
            output,
            payload: OutboundPayload::Json(bytes),
        })
    }

    fn send(&self, message: OutboundMessage) -> Result<()> {
        let output = message.output;
        self.sender
            .send(message)
            .map_err(|_| eyre::eyre!("Outbox closed, dropping message for '{}'", output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_preserves_order() {
        let (outbox, receiver) = outbox();
        outbox.send_values(GLOVE_RAW_OUTPUT, vec![1.0, 2.0]).unwrap();
        outbox
            .send_json(TELEMETRY_OUTPUT, &serde_json::json!({"ok": true}))
            .unwrap();

        let messages: Vec<_> = receiver.try_iter().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].output, GLOVE_RAW_OUTPUT);
        assert_eq!(messages[0].payload, OutboundPayload::Values(vec![1.0, 2.0]));
        assert_eq!(messages[1].output, TELEMETRY_OUTPUT);
    }

    #[test]
    fn test_outbox_reports_dropped_receiver() {
        let (outbox, receiver) = outbox();
        drop(receiver);
        assert!(outbox.send_values(GLOVE_RAW_OUTPUT, vec![0.0]).is_err());
    }
}
