use super::{
    check_joints, ControlBoard, DeviceOp, DeviceOptions, Encoders, PositionControl,
    PositionDirect,
};
use crate::{Outbox, DEVICE_REQUEST_OUTPUT};
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

pub const REMOTE_CONTROLBOARD: &str = "remote_controlboard";

/// Device call addressed to the robot-side control board behind `remote`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRequest {
    pub remote: String,
    pub local: String,
    #[serde(flatten)]
    pub op: DeviceOp,
}

/// Encoder readings published by the robot side for one control board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderFeedback {
    pub remote: String,
    pub values: Vec<f64>,
}

/// Latest encoder readings per remote port.
#[derive(Debug, Clone, Default)]
pub struct EncoderFeed(Rc<RefCell<HashMap<String, Vec<f64>>>>);

impl EncoderFeed {
    pub fn update(&self, feedback: EncoderFeedback) {
        self.0.borrow_mut().insert(feedback.remote, feedback.values);
    }

    pub fn latest(&self, remote: &str) -> Option<Vec<f64>> {
        self.0.borrow().get(remote).cloned()
    }
}

/// Control board living in another dataflow node. Every call is forwarded
/// as a [`DeviceRequest`] and encoders are served from the [`EncoderFeed`].
pub struct RemoteControlBoard {
    remote: String,
    local: String,
    axes: usize,
    outbox: Outbox,
    feed: EncoderFeed,
}

impl RemoteControlBoard {
    pub fn open(options: &DeviceOptions, outbox: Outbox, feed: EncoderFeed) -> Result<Self> {
        for port in [&options.remote, &options.local] {
            if !port.starts_with('/') {
                return Err(eyre::eyre!("Invalid port name '{}'", port));
            }
        }
        if options.axes == 0 {
            return Err(eyre::eyre!("Control board {} has no axes", options.remote));
        }

        let mut board = Self {
            remote: options.remote.clone(),
            local: options.local.clone(),
            axes: options.axes,
            outbox,
            feed,
        };
        board.request(DeviceOp::Open { axes: options.axes })?;
        Ok(board)
    }

    fn request(&mut self, op: DeviceOp) -> Result<()> {
        debug!("{} <- {:?}", self.remote, op);
        let request = DeviceRequest {
            remote: self.remote.clone(),
            local: self.local.clone(),
            op,
        };
        self.outbox.send_json(DEVICE_REQUEST_OUTPUT, &request)
    }
}

impl PositionControl for RemoteControlBoard {
    fn set_position_mode(&mut self) -> Result<()> {
        self.request(DeviceOp::SetPositionMode)
    }

    fn set_ref_speed(&mut self, joint: usize, speed: f64) -> Result<()> {
        check_joints(&[joint], &[speed], self.axes)?;
        self.request(DeviceOp::SetRefSpeed { joint, speed })
    }

    fn position_move(&mut self, joint: usize, angle: f64) -> Result<()> {
        check_joints(&[joint], &[angle], self.axes)?;
        self.request(DeviceOp::PositionMove { joint, angle })
    }

    fn position_move_joints(&mut self, joints: &[usize], refs: &[f64]) -> Result<()> {
        check_joints(joints, refs, self.axes)?;
        self.request(DeviceOp::PositionMoveJoints {
            joints: joints.to_vec(),
            refs: refs.to_vec(),
        })
    }
}

impl PositionDirect for RemoteControlBoard {
    fn set_position_direct_mode(&mut self) -> Result<()> {
        self.request(DeviceOp::SetPositionDirectMode)
    }

    fn set_position(&mut self, joint: usize, angle: f64) -> Result<()> {
        check_joints(&[joint], &[angle], self.axes)?;
        self.request(DeviceOp::SetPosition { joint, angle })
    }

    fn set_positions(&mut self, joints: &[usize], refs: &[f64]) -> Result<()> {
        check_joints(joints, refs, self.axes)?;
        self.request(DeviceOp::SetPositions {
            joints: joints.to_vec(),
            refs: refs.to_vec(),
        })
    }
}

impl Encoders for RemoteControlBoard {
    fn axes(&self) -> usize {
        self.axes
    }

    fn get_encoders(&mut self) -> Result<Vec<f64>> {
        let values = self
            .feed
            .latest(&self.remote)
            .ok_or_else(|| eyre::eyre!("No encoder feedback from {} yet", self.remote))?;

        if values.len() != self.axes {
            return Err(eyre::eyre!(
                "Encoder feedback from {} has {} values, expected {}",
                self.remote,
                values.len(),
                self.axes
            ));
        }
        Ok(values)
    }
}

impl ControlBoard for RemoteControlBoard {
    fn remote(&self) -> &str {
        &self.remote
    }

    fn view_position_control(&mut self) -> Option<&mut dyn PositionControl> {
        Some(self)
    }

    fn view_position_direct(&mut self) -> Option<&mut dyn PositionDirect> {
        Some(self)
    }

    fn view_encoders(&mut self) -> Option<&mut dyn Encoders> {
        Some(self)
    }

    fn close(&mut self) -> Result<()> {
        self.request(DeviceOp::Close)
    }
}
