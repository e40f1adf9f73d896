use eyre::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of vibration motors driven on the glove.
pub const VIBRATION_CHANNELS: usize = 6;

/// Number of finger bend sensors reported by the glove.
pub const FINGER_CHANNELS: usize = 5;

/// Upper bound (exclusive) of a raw finger sensor value.
pub const FINGER_SENSOR_MAX: f64 = 1024.0;

/// Vibration intensities for the glove, one per channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VibrationSample(pub [f64; VIBRATION_CHANNELS]);

impl VibrationSample {
    /// Build a sample from the first [`VIBRATION_CHANNELS`] values of an
    /// inbound message. Extra values are ignored.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.len() < VIBRATION_CHANNELS {
            return Err(eyre::eyre!(
                "Vibration message has {} fields, expected {}",
                values.len(),
                VIBRATION_CHANNELS
            ));
        }

        let mut channels = [0.0; VIBRATION_CHANNELS];
        channels.copy_from_slice(&values[..VIBRATION_CHANNELS]);
        Ok(Self(channels))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

/// Raw finger sensor values read from the glove, in `[0, 1024)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandReading(pub [f64; FINGER_CHANNELS]);

impl HandReading {
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.len() < FINGER_CHANNELS {
            return Err(eyre::eyre!(
                "Hand reading has {} values, expected {}",
                values.len(),
                FINGER_CHANNELS
            ));
        }

        let mut fingers = [0.0; FINGER_CHANNELS];
        fingers.copy_from_slice(&values[..FINGER_CHANNELS]);
        Ok(Self(fingers))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn is_in_range(&self) -> bool {
        self.0.iter().all(|v| (0.0..FINGER_SENSOR_MAX).contains(v))
    }
}

/// What to do with the held vibration sample when the glove controller
/// stops sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum VibrationStalenessPolicy {
    /// Keep returning the last received sample indefinitely.
    #[default]
    Hold,
    /// Zero the sample once no message arrived for `timeout_ms`.
    Reset { timeout_ms: u64 },
}

impl VibrationStalenessPolicy {
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            VibrationStalenessPolicy::Hold => None,
            VibrationStalenessPolicy::Reset { timeout_ms } => {
                Some(Duration::from_millis(*timeout_ms))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vibration_sample_defaults_to_zero() {
        let sample = VibrationSample::default();
        assert!(sample.is_zero());
        assert_eq!(sample.values().len(), VIBRATION_CHANNELS);
    }

    #[test]
    fn test_vibration_sample_rejects_short_message() {
        assert!(VibrationSample::from_values(&[0.1, 0.2, 0.3]).is_err());
    }

    #[test]
    fn test_vibration_sample_ignores_extra_fields() {
        let sample =
            VibrationSample::from_values(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]).unwrap();
        assert_eq!(sample.0, [0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_hand_reading_range() {
        let reading = HandReading::from_values(&[0.0, 100.0, 512.0, 900.0, 1023.0]).unwrap();
        assert!(reading.is_in_range());

        let reading = HandReading::from_values(&[0.0, 100.0, 512.0, 900.0, 1024.0]).unwrap();
        assert!(!reading.is_in_range());

        assert!(HandReading::from_values(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_staleness_policy_timeout() {
        assert_eq!(VibrationStalenessPolicy::Hold.timeout(), None);
        assert_eq!(
            VibrationStalenessPolicy::Reset { timeout_ms: 1000 }.timeout(),
            Some(Duration::from_secs(1))
        );
    }
}
