use super::{
    check_joints, ControlBoard, DeviceFactory, DeviceOp, DeviceOptions, Encoders,
    PositionControl, PositionDirect,
};
use crate::ControlMode;
use eyre::Result;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub const FAKE_CONTROLBOARD: &str = "fake_controlboard";

#[derive(Debug, Default)]
pub struct FakeBoardState {
    pub calls: Vec<DeviceOp>,
    pub positions: Vec<f64>,
    pub ref_speeds: HashMap<usize, f64>,
    pub mode: Option<ControlMode>,
    pub closed: bool,
}

/// Shared view on a fake board, kept by whoever opened it.
#[derive(Debug, Clone, Default)]
pub struct FakeHandle(Rc<RefCell<FakeBoardState>>);

impl FakeHandle {
    pub fn calls(&self) -> Vec<DeviceOp> {
        self.0.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.0.borrow_mut().calls.clear();
    }

    pub fn positions(&self) -> Vec<f64> {
        self.0.borrow().positions.clone()
    }

    pub fn ref_speed(&self, joint: usize) -> Option<f64> {
        self.0.borrow().ref_speeds.get(&joint).copied()
    }

    pub fn mode(&self) -> Option<ControlMode> {
        self.0.borrow().mode
    }

    pub fn is_closed(&self) -> bool {
        self.0.borrow().closed
    }
}

/// In-process simulated control board. Moves complete instantly, so the
/// encoders always report the last commanded angles.
pub struct FakeControlBoard {
    remote: String,
    axes: usize,
    has_position_direct: bool,
    state: FakeHandle,
}

impl FakeControlBoard {
    pub fn new(remote: &str, axes: usize) -> Self {
        let state = FakeHandle::default();
        state.0.borrow_mut().positions = vec![0.0; axes];
        Self {
            remote: remote.to_string(),
            axes,
            has_position_direct: true,
            state,
        }
    }

    pub fn without_position_direct(mut self) -> Self {
        self.has_position_direct = false;
        self
    }

    pub fn handle(&self) -> FakeHandle {
        self.state.clone()
    }

    fn record(&mut self, op: DeviceOp) -> Result<()> {
        let mut state = self.state.0.borrow_mut();
        if state.closed {
            return Err(eyre::eyre!("Control board {} is closed", self.remote));
        }

        match &op {
            DeviceOp::SetPositionMode => state.mode = Some(ControlMode::Trajectory),
            DeviceOp::SetPositionDirectMode => state.mode = Some(ControlMode::Direct),
            DeviceOp::SetRefSpeed { joint, speed } => {
                state.ref_speeds.insert(*joint, *speed);
            }
            DeviceOp::PositionMove { joint, angle } | DeviceOp::SetPosition { joint, angle } => {
                state.positions[*joint] = *angle;
            }
            DeviceOp::PositionMoveJoints { joints, refs } | DeviceOp::SetPositions { joints, refs } => {
                for (joint, angle) in joints.iter().zip(refs) {
                    state.positions[*joint] = *angle;
                }
            }
            DeviceOp::Close => state.closed = true,
            DeviceOp::Open { .. } => {}
        }

        state.calls.push(op);
        Ok(())
    }
}

impl PositionControl for FakeControlBoard {
    fn set_position_mode(&mut self) -> Result<()> {
        self.record(DeviceOp::SetPositionMode)
    }

    fn set_ref_speed(&mut self, joint: usize, speed: f64) -> Result<()> {
        check_joints(&[joint], &[speed], self.axes)?;
        self.record(DeviceOp::SetRefSpeed { joint, speed })
    }

    fn position_move(&mut self, joint: usize, angle: f64) -> Result<()> {
        check_joints(&[joint], &[angle], self.axes)?;
        self.record(DeviceOp::PositionMove { joint, angle })
    }

    fn position_move_joints(&mut self, joints: &[usize], refs: &[f64]) -> Result<()> {
        check_joints(joints, refs, self.axes)?;
        self.record(DeviceOp::PositionMoveJoints {
            joints: joints.to_vec(),
            refs: refs.to_vec(),
        })
    }
}

impl PositionDirect for FakeControlBoard {
    fn set_position_direct_mode(&mut self) -> Result<()> {
        self.record(DeviceOp::SetPositionDirectMode)
    }

    fn set_position(&mut self, joint: usize, angle: f64) -> Result<()> {
        check_joints(&[joint], &[angle], self.axes)?;
        self.record(DeviceOp::SetPosition { joint, angle })
    }

    fn set_positions(&mut self, joints: &[usize], refs: &[f64]) -> Result<()> {
        check_joints(joints, refs, self.axes)?;
        self.record(DeviceOp::SetPositions {
            joints: joints.to_vec(),
            refs: refs.to_vec(),
        })
    }
}

impl Encoders for FakeControlBoard {
    fn axes(&self) -> usize {
        self.axes
    }

    fn get_encoders(&mut self) -> Result<Vec<f64>> {
        Ok(self.state.positions())
    }
}

impl ControlBoard for FakeControlBoard {
    fn remote(&self) -> &str {
        &self.remote
    }

    fn view_position_control(&mut self) -> Option<&mut dyn PositionControl> {
        Some(self)
    }

    fn view_position_direct(&mut self) -> Option<&mut dyn PositionDirect> {
        if self.has_position_direct {
            Some(self)
        } else {
            None
        }
    }

    fn view_encoders(&mut self) -> Option<&mut dyn Encoders> {
        Some(self)
    }

    fn close(&mut self) -> Result<()> {
        self.record(DeviceOp::Close)
    }
}

/// Opens [`FakeControlBoard`]s and keeps a handle to each one by remote port.
#[derive(Debug, Default)]
pub struct FakeDriver {
    boards: HashMap<String, FakeHandle>,
    unreachable: HashSet<String>,
    without_position_direct: HashSet<String>,
    reported_axes: HashMap<String, usize>,
}

impl FakeDriver {
    /// Opening `remote` will fail.
    pub fn mark_unreachable(&mut self, remote: &str) {
        self.unreachable.insert(remote.to_string());
    }

    /// Boards opened on `remote` will not offer direct position control.
    pub fn mark_without_position_direct(&mut self, remote: &str) {
        self.without_position_direct.insert(remote.to_string());
    }

    /// Boards opened on `remote` report `axes` axes whatever was requested.
    pub fn report_axes(&mut self, remote: &str, axes: usize) {
        self.reported_axes.insert(remote.to_string(), axes);
    }

    pub fn handle(&self, remote: &str) -> Option<FakeHandle> {
        self.boards.get(remote).cloned()
    }

    pub fn open_board(&mut self, options: &DeviceOptions) -> Result<Box<dyn ControlBoard>> {
        if self.unreachable.contains(&options.remote) {
            return Err(eyre::eyre!("Cannot connect to {}", options.remote));
        }

        let axes = self
            .reported_axes
            .get(&options.remote)
            .copied()
            .unwrap_or(options.axes);

        let mut board = FakeControlBoard::new(&options.remote, axes);
        if self.without_position_direct.contains(&options.remote) {
            board = board.without_position_direct();
        }
        board.record(DeviceOp::Open { axes })?;

        self.boards.insert(options.remote.clone(), board.handle());
        Ok(Box::new(board))
    }
}

impl DeviceFactory for FakeDriver {
    fn open(&mut self, options: &DeviceOptions) -> Result<Box<dyn ControlBoard>> {
        self.open_board(options)
    }

    fn known_devices(&self) -> Vec<&'static str> {
        vec![FAKE_CONTROLBOARD]
    }
}
