use crate::{BodyPart, JointVelocityProfile, VibrationStalenessPolicy};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;

pub const DEFAULT_DEVICE: &str = "remote_controlboard";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelecontrolConfig {
    /// Robot name used to derive remote port names, e.g. `/icub/torso`.
    pub robot_name: String,
    /// Prefix for the local side of every device connection.
    pub local_prefix: String,
    pub body_parts: BodyPartsConfig,
    pub vibration: VibrationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyPartsConfig {
    pub left_arm: Option<BodyPartConfig>,
    pub right_arm: Option<BodyPartConfig>,
    pub torso: Option<BodyPartConfig>,
    pub head: Option<BodyPartConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyPartConfig {
    pub activated: bool,
    /// Stream positions directly instead of using firmware trajectories.
    pub use_direct: bool,
    pub dof: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(default = "default_device")]
    pub device: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VibrationConfig {
    pub staleness: VibrationStalenessPolicy,
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

impl BodyPartConfig {
    pub fn new(activated: bool, use_direct: bool, dof: usize) -> Self {
        Self {
            activated,
            use_direct,
            dof,
            remote: None,
            local: None,
            device: default_device(),
        }
    }
}

impl BodyPartsConfig {
    pub fn get(&self, part: BodyPart) -> Option<&BodyPartConfig> {
        match part {
            BodyPart::LeftArm => self.left_arm.as_ref(),
            BodyPart::RightArm => self.right_arm.as_ref(),
            BodyPart::Torso => self.torso.as_ref(),
            BodyPart::Head => self.head.as_ref(),
        }
    }

    pub fn get_mut(&mut self, part: BodyPart) -> &mut Option<BodyPartConfig> {
        match part {
            BodyPart::LeftArm => &mut self.left_arm,
            BodyPart::RightArm => &mut self.right_arm,
            BodyPart::Torso => &mut self.torso,
            BodyPart::Head => &mut self.head,
        }
    }
}

impl Default for TelecontrolConfig {
    /// Torso-only telecontrol with every part streaming positions directly.
    fn default() -> Self {
        let mut body_parts = BodyPartsConfig::default();
        for part in BodyPart::ALL {
            *body_parts.get_mut(part) = Some(BodyPartConfig::new(
                part == BodyPart::Torso,
                true,
                part.default_dof(),
            ));
        }

        Self {
            robot_name: "icub".to_string(),
            local_prefix: "/hapticGloveController".to_string(),
            body_parts,
            vibration: VibrationConfig::default(),
        }
    }
}

impl TelecontrolConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path))?;
        let config: TelecontrolConfig =
            toml::from_str(&content).wrap_err_with(|| format!("Failed to parse {}", path))?;
        Ok(config)
    }

    pub fn part(&self, part: BodyPart) -> Option<&BodyPartConfig> {
        self.body_parts.get(part)
    }

    /// Parts missing from the configuration are never activated.
    pub fn is_activated(&self, part: BodyPart) -> bool {
        self.part(part).map(|c| c.activated).unwrap_or(false)
    }

    pub fn is_direct(&self, part: BodyPart) -> bool {
        self.part(part).map(|c| c.use_direct).unwrap_or(false)
    }

    pub fn dof(&self, part: BodyPart) -> usize {
        self.part(part)
            .map(|c| c.dof)
            .unwrap_or_else(|| part.default_dof())
    }

    pub fn device(&self, part: BodyPart) -> &str {
        self.part(part)
            .map(|c| c.device.as_str())
            .unwrap_or(DEFAULT_DEVICE)
    }

    pub fn remote_port(&self, part: BodyPart) -> String {
        self.part(part)
            .and_then(|c| c.remote.clone())
            .unwrap_or_else(|| format!("/{}/{}", self.robot_name, part))
    }

    pub fn local_port(&self, part: BodyPart) -> String {
        self.part(part)
            .and_then(|c| c.local.clone())
            .unwrap_or_else(|| format!("{}/{}", self.local_prefix, part))
    }

    pub fn activated_parts(&self) -> impl Iterator<Item = BodyPart> + '_ {
        BodyPart::ALL
            .into_iter()
            .filter(move |part| self.is_activated(*part))
    }

    pub fn validate(&self) -> Result<()> {
        let mut remotes = HashSet::new();

        for part in BodyPart::ALL {
            let Some(config) = self.part(part) else {
                continue;
            };

            let commanded = part.commanded_joints().len();
            if config.dof < commanded {
                return Err(eyre::eyre!(
                    "{} DOF ({}) is smaller than its {} commanded joints",
                    part,
                    config.dof,
                    commanded
                ));
            }

            if !config.use_direct {
                for profile in [JointVelocityProfile::Normal, JointVelocityProfile::Low] {
                    if let Some((joint, _)) = profile
                        .ref_speeds(part)
                        .iter()
                        .find(|(joint, _)| *joint >= config.dof)
                    {
                        return Err(eyre::eyre!(
                            "{} {:?} velocity profile addresses joint {} beyond DOF {}",
                            part,
                            profile,
                            joint,
                            config.dof
                        ));
                    }
                }
            }

            let remote = self.remote_port(part);
            let local = self.local_port(part);
            for port in [&remote, &local] {
                if !port.starts_with('/') {
                    return Err(eyre::eyre!(
                        "{} port name '{}' must start with '/'",
                        part,
                        port
                    ));
                }
            }

            if config.activated && !remotes.insert(remote.clone()) {
                return Err(eyre::eyre!(
                    "Remote port '{}' is used by more than one body part",
                    remote
                ));
            }
        }

        if let VibrationStalenessPolicy::Reset { timeout_ms: 0 } = self.vibration.staleness {
            return Err(eyre::eyre!("Vibration staleness timeout must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelecontrolConfig::default();
        config.validate().unwrap();

        assert!(config.is_activated(BodyPart::Torso));
        assert!(!config.is_activated(BodyPart::LeftArm));
        assert!(!config.is_activated(BodyPart::RightArm));
        assert!(!config.is_activated(BodyPart::Head));

        for part in BodyPart::ALL {
            assert!(config.is_direct(part));
        }

        assert_eq!(config.dof(BodyPart::LeftArm), 16);
        assert_eq!(config.dof(BodyPart::RightArm), 16);
        assert_eq!(config.dof(BodyPart::Torso), 6);
        assert_eq!(config.dof(BodyPart::Head), 3);

        assert_eq!(config.remote_port(BodyPart::Torso), "/icub/torso");
        assert_eq!(
            config.local_port(BodyPart::Head),
            "/hapticGloveController/head"
        );
        assert_eq!(config.vibration.staleness, VibrationStalenessPolicy::Hold);
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
            robot_name = "icubSim"

            [vibration.staleness]
            policy = "reset"
            timeout_ms = 250

            [body_parts.left_arm]
            activated = true
            use_direct = false
            dof = 16
            remote = "/icubSim/left_arm"
            device = "fake_controlboard"

            [body_parts.head]
            activated = true
            use_direct = true
            dof = 3
        "#;

        let config: TelecontrolConfig = toml::from_str(content).unwrap();
        config.validate().unwrap();

        assert!(config.is_activated(BodyPart::LeftArm));
        assert!(!config.is_direct(BodyPart::LeftArm));
        assert_eq!(config.device(BodyPart::LeftArm), "fake_controlboard");
        assert_eq!(config.device(BodyPart::Head), DEFAULT_DEVICE);
        assert_eq!(config.remote_port(BodyPart::Head), "/icubSim/head");
        assert_eq!(
            config.local_port(BodyPart::LeftArm),
            "/hapticGloveController/left_arm"
        );

        // Parts left out of the file stay inactive
        assert!(config.part(BodyPart::Torso).is_none());
        assert!(!config.is_activated(BodyPart::Torso));
        assert_eq!(config.dof(BodyPart::Torso), 6);

        let activated: Vec<_> = config.activated_parts().collect();
        assert_eq!(activated, vec![BodyPart::LeftArm, BodyPart::Head]);

        assert_eq!(
            config.vibration.staleness,
            VibrationStalenessPolicy::Reset { timeout_ms: 250 }
        );
    }

    #[test]
    fn test_shipped_config_matches_default() {
        let content = include_str!("../../../config/telecontrol.toml");
        let config: TelecontrolConfig = toml::from_str(content).unwrap();
        config.validate().unwrap();

        let default = TelecontrolConfig::default();
        for part in BodyPart::ALL {
            assert_eq!(config.is_activated(part), default.is_activated(part));
            assert_eq!(config.is_direct(part), default.is_direct(part));
            assert_eq!(config.dof(part), default.dof(part));
            assert_eq!(config.remote_port(part), default.remote_port(part));
        }
    }

    #[test]
    fn test_validate_rejects_small_dof() {
        let mut config = TelecontrolConfig::default();
        *config.body_parts.get_mut(BodyPart::Head) = Some(BodyPartConfig::new(true, true, 2));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_profile_beyond_dof() {
        let mut config = TelecontrolConfig::default();
        *config.body_parts.get_mut(BodyPart::RightArm) =
            Some(BodyPartConfig::new(true, false, 7));
        assert!(config.validate().is_err());

        // Direct-mode parts never receive reference speeds
        *config.body_parts.get_mut(BodyPart::RightArm) =
            Some(BodyPartConfig::new(true, true, 7));
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_relative_port() {
        let mut config = TelecontrolConfig::default();
        let mut torso = BodyPartConfig::new(true, true, 6);
        torso.remote = Some("icub/torso".to_string());
        *config.body_parts.get_mut(BodyPart::Torso) = Some(torso);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_remote() {
        let mut config = TelecontrolConfig::default();
        for part in [BodyPart::Torso, BodyPart::Head] {
            let mut part_config = BodyPartConfig::new(true, true, part.default_dof());
            part_config.remote = Some("/icub/upper_body".to_string());
            *config.body_parts.get_mut(part) = Some(part_config);
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = TelecontrolConfig::default();
        config.vibration.staleness = VibrationStalenessPolicy::Reset { timeout_ms: 0 };
        assert!(config.validate().is_err());
    }
}
