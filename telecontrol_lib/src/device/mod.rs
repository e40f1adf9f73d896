//! Control-board device interfaces and the driver registry that opens them.
//!
//! A [`ControlBoard`] is one connection to a robot body part. The controller
//! never talks to a board directly: it asks for the interface it needs
//! ([`PositionControl`], [`PositionDirect`], [`Encoders`]) and a board that
//! cannot provide one is treated as unusable.

pub mod fake;
pub mod remote;

pub use fake::*;
pub use remote::*;

use crate::Outbox;
use eyre::Result;
use serde::{Deserialize, Serialize};

/// Trajectory position control: the firmware interpolates to each target
/// at the joint's reference speed.
pub trait PositionControl {
    fn set_position_mode(&mut self) -> Result<()>;
    fn set_ref_speed(&mut self, joint: usize, speed: f64) -> Result<()>;
    fn position_move(&mut self, joint: usize, angle: f64) -> Result<()>;
    fn position_move_joints(&mut self, joints: &[usize], refs: &[f64]) -> Result<()>;
}

/// Direct position streaming, applied without trajectory generation.
pub trait PositionDirect {
    fn set_position_direct_mode(&mut self) -> Result<()>;
    fn set_position(&mut self, joint: usize, angle: f64) -> Result<()>;
    fn set_positions(&mut self, joints: &[usize], refs: &[f64]) -> Result<()>;
}

pub trait Encoders {
    fn axes(&self) -> usize;
    /// Latest encoder value of every axis, in device units.
    fn get_encoders(&mut self) -> Result<Vec<f64>>;
}

pub trait ControlBoard {
    /// Remote port this board is connected to.
    fn remote(&self) -> &str;
    fn view_position_control(&mut self) -> Option<&mut dyn PositionControl>;
    fn view_position_direct(&mut self) -> Option<&mut dyn PositionDirect>;
    fn view_encoders(&mut self) -> Option<&mut dyn Encoders>;
    fn close(&mut self) -> Result<()>;
}

/// One control-board call, as recorded by the fake driver or forwarded by
/// the remote driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DeviceOp {
    Open { axes: usize },
    SetPositionMode,
    SetPositionDirectMode,
    SetRefSpeed { joint: usize, speed: f64 },
    PositionMove { joint: usize, angle: f64 },
    PositionMoveJoints { joints: Vec<usize>, refs: Vec<f64> },
    SetPosition { joint: usize, angle: f64 },
    SetPositions { joints: Vec<usize>, refs: Vec<f64> },
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOptions {
    pub device: String,
    pub remote: String,
    pub local: String,
    pub axes: usize,
}

pub trait DeviceFactory {
    fn open(&mut self, options: &DeviceOptions) -> Result<Box<dyn ControlBoard>>;
    fn known_devices(&self) -> Vec<&'static str>;
}

pub(crate) fn check_joints(joints: &[usize], refs: &[f64], axes: usize) -> Result<()> {
    if joints.len() != refs.len() {
        return Err(eyre::eyre!(
            "{} joints given with {} references",
            joints.len(),
            refs.len()
        ));
    }
    if let Some(joint) = joints.iter().find(|j| **j >= axes) {
        return Err(eyre::eyre!("Joint {} out of range ({} axes)", joint, axes));
    }
    Ok(())
}

/// Opens boards by driver name: [`REMOTE_CONTROLBOARD`] or
/// [`FAKE_CONTROLBOARD`].
pub struct DriverRegistry {
    outbox: Outbox,
    encoder_feed: EncoderFeed,
    fake: FakeDriver,
}

impl DriverRegistry {
    pub fn new(outbox: Outbox) -> Self {
        Self {
            outbox,
            encoder_feed: EncoderFeed::default(),
            fake: FakeDriver::default(),
        }
    }

    /// Shared encoder cache fed from the robot side.
    pub fn encoder_feed(&self) -> EncoderFeed {
        self.encoder_feed.clone()
    }

    #[cfg(test)]
    fn fake_driver(&self) -> &FakeDriver {
        &self.fake
    }
}

impl DeviceFactory for DriverRegistry {
    fn open(&mut self, options: &DeviceOptions) -> Result<Box<dyn ControlBoard>> {
        match options.device.as_str() {
            REMOTE_CONTROLBOARD => {
                let board = RemoteControlBoard::open(
                    options,
                    self.outbox.clone(),
                    self.encoder_feed.clone(),
                )?;
                Ok(Box::new(board))
            }
            FAKE_CONTROLBOARD => self.fake.open_board(options),
            other => Err(eyre::eyre!("Unknown device '{}'", other)),
        }
    }

    fn known_devices(&self) -> Vec<&'static str> {
        vec![REMOTE_CONTROLBOARD, FAKE_CONTROLBOARD]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox;

    fn options(device: &str) -> DeviceOptions {
        DeviceOptions {
            device: device.to_string(),
            remote: "/icub/torso".to_string(),
            local: "/hapticGloveController/torso".to_string(),
            axes: 6,
        }
    }

    #[test]
    fn test_registry_opens_known_drivers() {
        let (outbox, _receiver) = outbox();
        let mut registry = DriverRegistry::new(outbox);

        let board = registry.open(&options(REMOTE_CONTROLBOARD)).unwrap();
        assert_eq!(board.remote(), "/icub/torso");

        let board = registry.open(&options(FAKE_CONTROLBOARD)).unwrap();
        assert_eq!(board.remote(), "/icub/torso");
        assert!(registry.fake_driver().handle("/icub/torso").is_some());
    }

    #[test]
    fn test_registry_rejects_unknown_driver() {
        let (outbox, _receiver) = outbox();
        let mut registry = DriverRegistry::new(outbox);

        let err = registry.open(&options("gazebo_controlboard")).err().unwrap();
        assert!(err.to_string().contains("gazebo_controlboard"));
        assert_eq!(
            registry.known_devices(),
            vec![REMOTE_CONTROLBOARD, FAKE_CONTROLBOARD]
        );
    }

    #[test]
    fn test_device_op_wire_format() {
        let op = DeviceOp::SetRefSpeed {
            joint: 2,
            speed: 10.0,
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "set_ref_speed");
        assert_eq!(json["joint"], 2);
    }

    #[test]
    fn test_check_joints() {
        check_joints(&[0, 1, 2], &[0.0, 1.0, 2.0], 3).unwrap();
        assert!(check_joints(&[0, 1], &[0.0], 3).is_err());
        assert!(check_joints(&[0, 3], &[0.0, 1.0], 3).is_err());
    }
}
