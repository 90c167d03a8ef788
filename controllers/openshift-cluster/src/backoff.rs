//! # Poll Backoff
//!
//! Bounded exponential backoff for polling long-running ARM operations.
//! A `Retry-After` hint from the service replaces the computed delay for that
//! poll but is still capped at the maximum.

use std::time::Duration;

/// Poll timing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay before the second poll
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Growth factor applied after each poll
    pub multiplier: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(60),
            multiplier: 2,
        }
    }
}

/// Exponential backoff calculator
#[derive(Debug, Clone)]
pub struct PollBackoff {
    settings: PollSettings,
    current: Duration,
}

impl PollBackoff {
    #[must_use]
    pub fn new(settings: PollSettings) -> Self {
        Self {
            current: settings.initial_delay.min(settings.max_delay),
            settings,
        }
    }

    /// Get the next delay and advance the sequence.
    ///
    /// `hint` is the provider-suggested delay (`Retry-After`), if any.
    pub fn next_delay(&mut self, hint: Option<Duration>) -> Duration {
        let computed = self.current;
        self.current = self
            .current
            .saturating_mul(self.settings.multiplier.max(1))
            .min(self.settings.max_delay);

        hint.unwrap_or(computed).min(self.settings.max_delay)
    }
}
