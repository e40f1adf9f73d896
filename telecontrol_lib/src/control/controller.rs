use crate::{
    BodyPart, ControlBoard, ControlMode, DeviceFactory, DeviceOptions, JointVelocityProfile,
    PositionControl, PositionDirect, TelecontrolConfig,
};
use eyre::{Result, WrapErr};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct PartSlot {
    /// `None` when the device could not be opened or has been closed.
    board: Option<Box<dyn ControlBoard>>,
    mode: Option<ControlMode>,
    last_command: Option<Vec<f64>>,
}

/// Owns one control board per activated body part and applies control-mode
/// and velocity selection to all of them.
///
/// Parts whose device failed to open are kept as inert slots: they are
/// skipped by mode and velocity selection and reject movement commands.
pub struct BodyPartController {
    config: TelecontrolConfig,
    parts: BTreeMap<BodyPart, PartSlot>,
}

fn position_control(board: &mut dyn ControlBoard) -> Result<&mut dyn PositionControl> {
    board
        .view_position_control()
        .ok_or_else(|| eyre::eyre!("Position control interface unavailable"))
}

fn position_direct(board: &mut dyn ControlBoard) -> Result<&mut dyn PositionDirect> {
    board
        .view_position_direct()
        .ok_or_else(|| eyre::eyre!("Position direct interface unavailable"))
}

fn has_interfaces(board: &mut dyn ControlBoard) -> bool {
    board.view_position_control().is_some()
        && board.view_position_direct().is_some()
        && board.view_encoders().is_some()
}

impl BodyPartController {
    /// Open a device for every activated body part. Failures are logged and
    /// leave the part inert.
    pub fn connect(config: TelecontrolConfig, factory: &mut dyn DeviceFactory) -> Self {
        let mut parts = BTreeMap::new();

        for part in config.activated_parts() {
            let options = DeviceOptions {
                device: config.device(part).to_string(),
                remote: config.remote_port(part),
                local: config.local_port(part),
                axes: config.dof(part),
            };

            let board = match factory.open(&options) {
                Ok(mut board) => {
                    if has_interfaces(board.as_mut()) {
                        info!(
                            "Connected {} to {} via {} ({} DOF, {})",
                            part,
                            options.remote,
                            options.device,
                            options.axes,
                            if config.is_direct(part) {
                                "direct"
                            } else {
                                "trajectory"
                            }
                        );
                        Some(board)
                    } else {
                        error!("Problems acquiring interfaces for {}", part);
                        if let Err(e) = board.close() {
                            warn!("Failed to close {}: {}", options.remote, e);
                        }
                        None
                    }
                }
                Err(e) => {
                    error!(
                        "Device {} not available for {}: {}",
                        options.device, part, e
                    );
                    info!("Known devices: {}", factory.known_devices().join(", "));
                    None
                }
            };

            parts.insert(
                part,
                PartSlot {
                    board,
                    ..Default::default()
                },
            );
        }

        Self { config, parts }
    }

    pub fn config(&self) -> &TelecontrolConfig {
        &self.config
    }

    pub fn dof(&self, part: BodyPart) -> usize {
        self.config.dof(part)
    }

    pub fn is_direct(&self, part: BodyPart) -> bool {
        self.config.is_direct(part)
    }

    pub fn is_activated(&self, part: BodyPart) -> bool {
        self.config.is_activated(part)
    }

    /// Activated and backed by an open device.
    pub fn is_connected(&self, part: BodyPart) -> bool {
        self.parts
            .get(&part)
            .map(|slot| slot.board.is_some())
            .unwrap_or(false)
    }

    /// Mode most recently selected on the part's device.
    pub fn control_mode(&self, part: BodyPart) -> Option<ControlMode> {
        self.parts.get(&part).and_then(|slot| slot.mode)
    }

    /// Angles of the last successful whole-part command.
    pub fn last_command(&self, part: BodyPart) -> Option<&[f64]> {
        self.parts
            .get(&part)
            .and_then(|slot| slot.last_command.as_deref())
    }

    /// Select direct streaming while a movement is running (`finished ==
    /// false`) on parts configured for it, trajectory control otherwise.
    pub fn set_control_mode(&mut self, finished: bool) {
        for (part, slot) in self.parts.iter_mut() {
            let mode = if self.config.is_direct(*part) && !finished {
                ControlMode::Direct
            } else {
                ControlMode::Trajectory
            };

            let Some(board) = slot.board.as_deref_mut() else {
                debug!("Skipping mode selection for disconnected {}", part);
                continue;
            };

            let result = match mode {
                ControlMode::Direct => {
                    position_direct(board).and_then(|pd| pd.set_position_direct_mode())
                }
                ControlMode::Trajectory => {
                    position_control(board).and_then(|pc| pc.set_position_mode())
                }
            };

            match result {
                Ok(()) => {
                    debug!("{} switched to {:?} mode", part, mode);
                    slot.mode = Some(mode);
                }
                Err(e) => warn!("Failed to select {:?} mode for {}: {}", mode, part, e),
            }
        }
    }

    /// Apply reference speeds to every trajectory-mode part. Direct-mode
    /// parts are left untouched.
    pub fn set_velocity(&mut self, profile: JointVelocityProfile) {
        for (part, slot) in self.parts.iter_mut() {
            if self.config.is_direct(*part) {
                continue;
            }

            let Some(board) = slot.board.as_deref_mut() else {
                debug!("Skipping velocity profile for disconnected {}", part);
                continue;
            };

            let pc = match position_control(board) {
                Ok(pc) => pc,
                Err(e) => {
                    warn!("Cannot set {:?} velocity on {}: {}", profile, part, e);
                    continue;
                }
            };

            for (joint, speed) in profile.ref_speeds(*part) {
                if let Err(e) = pc.set_ref_speed(*joint, *speed) {
                    warn!("Failed to set {} joint {} speed: {}", part, joint, e);
                }
            }
            debug!("Applied {:?} velocity profile to {}", profile, part);
        }
    }

    fn slot_mut(&mut self, part: BodyPart) -> Result<&mut PartSlot> {
        if !self.config.is_activated(part) {
            return Err(eyre::eyre!("{} is not activated", part));
        }
        self.parts
            .get_mut(&part)
            .ok_or_else(|| eyre::eyre!("{} has no control slot", part))
    }

    fn board_mut(slot: &mut PartSlot, part: BodyPart) -> Result<&mut (dyn ControlBoard + 'static)> {
        slot.board
            .as_deref_mut()
            .ok_or_else(|| eyre::eyre!("{} has no connected device", part))
    }

    /// Move a single joint of an activated part.
    pub fn move_joint(&mut self, part: BodyPart, joint_id: usize, angle: f64) -> Result<()> {
        let direct = self.config.is_direct(part);
        let slot = self.slot_mut(part)?;
        let board = Self::board_mut(slot, part)?;

        let result = if direct {
            position_direct(board)?.set_position(joint_id, angle)
        } else {
            position_control(board)?.position_move(joint_id, angle)
        };
        result.wrap_err_with(|| format!("Failed to move {} joint {}", part, joint_id))
    }

    /// Command every joint in [`BodyPart::commanded_joints`] at once.
    pub fn move_body_part(&mut self, part: BodyPart, angles: &[f64]) -> Result<()> {
        let direct = self.config.is_direct(part);
        let slot = self.slot_mut(part)?;

        let joints = part.commanded_joints();
        if angles.len() != joints.len() {
            return Err(eyre::eyre!(
                "{} expects {} angles, got {}",
                part,
                joints.len(),
                angles.len()
            ));
        }

        let board = Self::board_mut(slot, part)?;
        let result = if direct {
            position_direct(board)?.set_positions(joints, angles)
        } else {
            position_control(board)?.position_move_joints(joints, angles)
        };
        result.wrap_err_with(|| format!("Failed to move {}", part))?;

        slot.last_command = Some(angles.to_vec());
        Ok(())
    }

    /// Current encoder values, exactly [`Self::dof`] of them.
    pub fn read_joint_positions(&mut self, part: BodyPart) -> Result<Vec<f64>> {
        let dof = self.config.dof(part);
        let slot = self.slot_mut(part)?;
        let board = Self::board_mut(slot, part)?;

        let encoders = board
            .view_encoders()
            .ok_or_else(|| eyre::eyre!("Encoder interface unavailable"))?;

        let axes = encoders.axes();
        if axes != dof {
            return Err(eyre::eyre!(
                "{} device has {} axes, configured DOF is {}",
                part,
                axes,
                dof
            ));
        }

        let values = encoders
            .get_encoders()
            .wrap_err_with(|| format!("Failed to read {} encoders", part))?;

        if values.len() != axes {
            return Err(eyre::eyre!(
                "{} reported {} encoders, expected {}",
                part,
                values.len(),
                axes
            ));
        }
        Ok(values)
    }

    /// Close every open device. Parts become inert afterwards.
    pub fn close(&mut self) {
        for (part, slot) in self.parts.iter_mut() {
            if let Some(mut board) = slot.board.take() {
                match board.close() {
                    Ok(()) => info!("Closed {} device {}", part, board.remote()),
                    Err(e) => warn!("Failed to close {} device: {}", part, e),
                }
            }
        }
    }
}
