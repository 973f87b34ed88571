//! Reconnect backoff

use chat_common::ReconnectSettings;
use rand::Rng;
use std::time::Duration;

/// Configuration for auto-reconnect behavior
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Ceiling for the exponential delay
    pub max_delay: Duration,
    /// Maximum number of attempts (0 = infinite)
    pub max_attempts: u32,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Random extra delay, as a fraction of the computed delay
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 0,
            multiplier: 1.5,
            jitter: 0.2,
        }
    }
}

impl From<ReconnectSettings> for ReconnectPolicy {
    fn from(settings: ReconnectSettings) -> Self {
        Self {
            initial_delay: settings.initial_delay,
            max_delay: settings.max_delay,
            max_attempts: settings.max_attempts,
            ..Self::default()
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (zero-based), without jitter
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.min(64) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry number `attempt`, with jitter applied
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter <= 0.0 {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0.0..=self.jitter);
        base.mul_f64(1.0 + extra).min(self.max_delay)
    }

    /// No retries left after `attempts` failures
    #[must_use]
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }
}
