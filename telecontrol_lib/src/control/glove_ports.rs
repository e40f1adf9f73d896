use crate::{HandReading, Outbox, VibrationSample, VibrationStalenessPolicy, GLOVE_RAW_OUTPUT};
use eyre::Result;
use std::time::Instant;
use tracing::{debug, warn};

/// Inbound vibration commands for the glove with hold-last-value reads.
///
/// Messages are delivered by the event loop and consumed by
/// [`VibrationInbox::read`], which never blocks. Only the newest well-formed
/// undelivered message is kept.
#[derive(Debug)]
pub struct VibrationInbox {
    pending: Option<VibrationSample>,
    held: VibrationSample,
    last_received: Option<Instant>,
    policy: VibrationStalenessPolicy,
}

impl VibrationInbox {
    pub fn new(policy: VibrationStalenessPolicy) -> Self {
        Self {
            pending: None,
            held: VibrationSample::default(),
            last_received: None,
            policy,
        }
    }

    /// Malformed messages are dropped here and never displace a pending
    /// sample.
    pub fn deliver(&mut self, values: &[f64]) {
        let sample = match VibrationSample::from_values(values) {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Ignoring vibration message: {}", e);
                return;
            }
        };

        if self.pending.replace(sample).is_some() {
            debug!("Vibration message superseded before it was read");
        }
    }

    pub fn read(&mut self) -> VibrationSample {
        self.read_at(Instant::now())
    }

    pub fn read_at(&mut self, now: Instant) -> VibrationSample {
        match self.pending.take() {
            Some(sample) => {
                self.held = sample;
                self.last_received = Some(now);
            }
            None => self.expire_stale(now),
        }
        self.held
    }

    fn expire_stale(&mut self, now: Instant) {
        let (Some(timeout), Some(last)) = (self.policy.timeout(), self.last_received) else {
            return;
        };

        if now.duration_since(last) > timeout && !self.held.is_zero() {
            debug!("No vibration command for {:?}, resetting", timeout);
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.held = VibrationSample::default();
    }

    /// Last sample returned by a read, without consuming pending input.
    pub fn held(&self) -> VibrationSample {
        self.held
    }
}

pub trait HandReadingSink {
    fn write(&mut self, reading: &HandReading) -> Result<()>;
}

/// Publishes hand readings on [`GLOVE_RAW_OUTPUT`].
pub struct OutboxHandSink {
    outbox: Outbox,
}

impl OutboxHandSink {
    pub fn new(outbox: Outbox) -> Self {
        Self { outbox }
    }
}

impl HandReadingSink for OutboxHandSink {
    fn write(&mut self, reading: &HandReading) -> Result<()> {
        self.outbox
            .send_values(GLOVE_RAW_OUTPUT, reading.values().to_vec())
    }
}
