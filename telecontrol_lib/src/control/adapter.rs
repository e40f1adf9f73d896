use super::{BodyPartController, HandReadingSink, VibrationInbox};
use crate::{
    BodyPartTelemetry, HandReading, TelecontrolCommand, TelecontrolTelemetry, VibrationSample,
};
use eyre::Result;
use tracing::{debug, info};

/// Single owner of everything the telecontrol node drives: the body-part
/// devices, the inbound vibration port and the outbound hand-reading port.
pub struct TelecontrolAdapter {
    controller: BodyPartController,
    vibration: VibrationInbox,
    hand_sink: Box<dyn HandReadingSink>,
}

impl TelecontrolAdapter {
    pub fn new(controller: BodyPartController, hand_sink: Box<dyn HandReadingSink>) -> Self {
        let policy = controller.config().vibration.staleness;
        info!("Vibration staleness policy: {:?}", policy);

        Self {
            controller,
            vibration: VibrationInbox::new(policy),
            hand_sink,
        }
    }

    pub fn execute(&mut self, command: TelecontrolCommand) -> Result<()> {
        match command {
            TelecontrolCommand::SetControlMode { finished } => {
                self.controller.set_control_mode(finished);
                Ok(())
            }
            TelecontrolCommand::SetVelocity { profile } => {
                self.controller.set_velocity(profile);
                Ok(())
            }
            TelecontrolCommand::MoveJoint {
                body_part,
                joint_id,
                angle,
            } => self.controller.move_joint(body_part, joint_id, angle),
            TelecontrolCommand::MoveBodyPart { body_part, angles } => {
                self.controller.move_body_part(body_part, &angles)
            }
        }
    }

    /// Hand a received vibration message to the inbound port.
    pub fn deliver_vibration(&mut self, values: &[f64]) {
        self.vibration.deliver(values);
    }

    /// Non-blocking: the newest delivered sample, or the held one.
    pub fn read_vibration_command(&mut self) -> VibrationSample {
        self.vibration.read()
    }

    pub fn reset_vibration(&mut self) {
        self.vibration.reset();
    }

    pub fn write_hand_reading(&mut self, values: &[f64]) -> Result<()> {
        let reading = HandReading::from_values(values)?;
        if !reading.is_in_range() {
            debug!("Hand reading outside sensor range: {:?}", reading.values());
        }
        self.hand_sink.write(&reading)
    }

    /// Commanded angles against encoder readings for every activated part.
    pub fn telemetry(&mut self) -> TelecontrolTelemetry {
        let mut telemetry = TelecontrolTelemetry::new(self.vibration.held());
        let parts: Vec<_> = self.controller.config().activated_parts().collect();

        for body_part in parts {
            let encoders = if self.controller.is_connected(body_part) {
                match self.controller.read_joint_positions(body_part) {
                    Ok(values) => Some(values),
                    Err(e) => {
                        debug!("No encoders for {}: {}", body_part, e);
                        None
                    }
                }
            } else {
                None
            };

            telemetry.body_parts.push(BodyPartTelemetry {
                body_part,
                direct: self.controller.is_direct(body_part),
                connected: self.controller.is_connected(body_part),
                commanded: self.controller.last_command(body_part).map(|a| a.to_vec()),
                encoders,
            });
        }

        telemetry
    }

    pub fn close(&mut self) {
        self.controller.close();
    }
}
