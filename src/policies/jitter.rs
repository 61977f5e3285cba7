//! # Jitter for reconnect delays.
//!
//! Many clients reconnecting to the same endpoint after an outage would otherwise
//! retry in lockstep.
//!
//! - [`JitterPolicy::None`]: exact delay
//! - [`JitterPolicy::Full`]: random in `[0, delay]`
//! - [`JitterPolicy::Equal`]: `delay/2 + random[0, delay/2]`

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Randomization applied to a backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterPolicy {
    /// Exact backoff delay.
    #[default]
    None,
    /// Random delay in `[0, delay]`.
    Full,
    /// Random delay in `[delay/2, delay]`.
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return delay;
        }
        let mut rng = rand::rng();
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => Duration::from_millis(rng.random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                let extra = if half == 0 { 0 } else { rng.random_range(0..=half) };
                Duration::from_millis(half + extra)
            }
        }
    }
}
