use std::time::Duration;

use crate::config::ReconnectConfig;
use crate::transport::NORMAL_CLOSURE;

/// Linear back-off with a bounded number of consecutive attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
    pub max_delay_factor: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            max_attempts: config.max_attempts,
            max_delay_factor: config.max_delay_factor.max(1),
        }
    }
}

/// What to do after the connection closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Orderly close, nothing to do
    Normal,
    Reconnect { attempt: u32, delay: Duration },
    /// Ceiling reached; the user has to retry by hand
    Exhausted { attempts: u32 },
}

impl ReconnectPolicy {
    /// `base × min(attempt, max_delay_factor)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.min(self.max_delay_factor)
    }

    /// Decide how to react to a close with `code` after `attempts`
    /// consecutive failed attempts. Returns the new attempt count.
    pub fn on_close(&self, code: u16, attempts: u32) -> (CloseOutcome, u32) {
        if code != NORMAL_CLOSURE && attempts < self.max_attempts {
            let attempt = attempts + 1;
            let outcome = CloseOutcome::Reconnect {
                attempt,
                delay: self.delay_for(attempt),
            };
            (outcome, attempt)
        } else if attempts >= self.max_attempts {
            (CloseOutcome::Exhausted { attempts }, attempts)
        } else {
            (CloseOutcome::Normal, attempts)
        }
    }
}
