use serde::{Deserialize, Serialize};
use std::fmt;

/// Joints addressed by a whole-arm command.
pub const ARM_COMMANDED_JOINTS: [usize; 4] = [0, 1, 2, 3];

/// Joints addressed by a whole torso or head command.
pub const TORSO_HEAD_COMMANDED_JOINTS: [usize; 3] = [0, 1, 2];

/// Robot body parts that can be tele-operated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    LeftArm,
    RightArm,
    Torso,
    Head,
}

impl BodyPart {
    pub const ALL: [BodyPart; 4] = [
        BodyPart::LeftArm,
        BodyPart::RightArm,
        BodyPart::Torso,
        BodyPart::Head,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyPart::LeftArm => "left_arm",
            BodyPart::RightArm => "right_arm",
            BodyPart::Torso => "torso",
            BodyPart::Head => "head",
        }
    }

    pub fn is_arm(&self) -> bool {
        matches!(self, BodyPart::LeftArm | BodyPart::RightArm)
    }

    /// Joint indices covered by a whole-part position command.
    pub fn commanded_joints(&self) -> &'static [usize] {
        if self.is_arm() {
            &ARM_COMMANDED_JOINTS
        } else {
            &TORSO_HEAD_COMMANDED_JOINTS
        }
    }

    /// Number of joints on the robot for this part.
    pub fn default_dof(&self) -> usize {
        match self {
            BodyPart::LeftArm | BodyPart::RightArm => 16,
            BodyPart::Torso => 6,
            BodyPart::Head => 3,
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position control mode selected on a control board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Firmware interpolates towards the target at the reference speed.
    Trajectory,
    /// Targets are applied every cycle without interpolation.
    Direct,
}

/// Reference-speed profile applied to parts running in trajectory mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointVelocityProfile {
    Normal,
    Low,
}

// (joint, reference speed in deg/s)
const ARM_NORMAL: [(usize, f64); 10] = [
    (0, 5.0),
    (1, 5.0),
    (2, 5.0),
    (3, 5.0),
    (10, 0.0),
    (11, 0.0),
    (12, 0.0),
    (13, 0.0),
    (14, 0.0),
    (15, 0.0),
];
const ARM_LOW: [(usize, f64); 10] = [
    (0, 3.0),
    (1, 3.0),
    (2, 3.0),
    (3, 3.0),
    (10, 0.0),
    (11, 0.0),
    (12, 0.0),
    (13, 0.0),
    (14, 0.0),
    (15, 0.0),
];
const TORSO_NORMAL: [(usize, f64); 3] = [(0, 10.0), (1, 10.0), (2, 10.0)];
const TORSO_LOW: [(usize, f64); 3] = [(0, 3.0), (1, 3.0), (2, 3.0)];
const HEAD_NORMAL: [(usize, f64); 3] = [(0, 5.0), (1, 5.0), (2, 5.0)];
const HEAD_LOW: [(usize, f64); 3] = [(0, 1.0), (1, 1.0), (2, 1.0)];

impl JointVelocityProfile {
    /// Per-joint reference speeds for `part`.
    pub fn ref_speeds(&self, part: BodyPart) -> &'static [(usize, f64)] {
        match (part, self) {
            (BodyPart::LeftArm | BodyPart::RightArm, JointVelocityProfile::Normal) => &ARM_NORMAL,
            (BodyPart::LeftArm | BodyPart::RightArm, JointVelocityProfile::Low) => &ARM_LOW,
            (BodyPart::Torso, JointVelocityProfile::Normal) => &TORSO_NORMAL,
            (BodyPart::Torso, JointVelocityProfile::Low) => &TORSO_LOW,
            (BodyPart::Head, JointVelocityProfile::Normal) => &HEAD_NORMAL,
            (BodyPart::Head, JointVelocityProfile::Low) => &HEAD_LOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commanded_joints() {
        assert_eq!(BodyPart::LeftArm.commanded_joints(), &[0, 1, 2, 3]);
        assert_eq!(BodyPart::RightArm.commanded_joints(), &[0, 1, 2, 3]);
        assert_eq!(BodyPart::Torso.commanded_joints(), &[0, 1, 2]);
        assert_eq!(BodyPart::Head.commanded_joints(), &[0, 1, 2]);
    }

    #[test]
    fn test_body_part_serde_names() {
        let json = serde_json::to_string(&BodyPart::RightArm).unwrap();
        assert_eq!(json, "\"right_arm\"");

        let part: BodyPart = serde_json::from_str("\"head\"").unwrap();
        assert_eq!(part, BodyPart::Head);
        assert_eq!(part.to_string(), "head");
    }

    #[test]
    fn test_low_profile_is_slower_than_normal() {
        for part in BodyPart::ALL {
            let normal = JointVelocityProfile::Normal.ref_speeds(part);
            let low = JointVelocityProfile::Low.ref_speeds(part);
            assert_eq!(normal.len(), low.len());

            for (n, l) in normal.iter().zip(low) {
                assert_eq!(n.0, l.0);
                assert!(l.1 <= n.1, "{} joint {} low speed above normal", part, n.0);
            }
        }
    }

    #[test]
    fn test_every_part_has_speeds_within_dof() {
        for part in BodyPart::ALL {
            for profile in [JointVelocityProfile::Normal, JointVelocityProfile::Low] {
                let speeds = profile.ref_speeds(part);
                assert!(!speeds.is_empty(), "{} has no {:?} speeds", part, profile);
                assert!(speeds.iter().all(|(joint, _)| *joint < part.default_dof()));
            }
        }
    }

    #[test]
    fn test_arm_hand_joints_are_frozen() {
        let speeds = JointVelocityProfile::Normal.ref_speeds(BodyPart::LeftArm);
        assert!(speeds
            .iter()
            .filter(|(joint, _)| *joint >= 10)
            .all(|(_, speed)| *speed == 0.0));
    }
}
