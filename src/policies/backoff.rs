//! # Reconnect backoff.
//!
//! [`BackoffPolicy`] computes the delay before reconnect attempt `n` (0-indexed,
//! counted since the last connection that reached open):
//!
//! ```text
//! delay(n) = min(first × factor^n, max)   then jitter
//! ```
//!
//! With the defaults this is 1s, 2s, 4s, 8s, 16s, 30s, 30s, ...
//!
//! The base delay depends only on `n`, so jitter never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use jetstream::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy::default();
//! assert_eq!(backoff.next(0), Duration::from_secs(1));
//! assert_eq!(backoff.next(3), Duration::from_secs(8));
//! assert_eq!(backoff.next(9), Duration::from_secs(30));
//! assert_eq!(backoff.jitter, JitterPolicy::None);
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::policies::jitter::JitterPolicy;

/// Reconnect backoff policy.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay before the first reconnect.
    #[serde(with = "millis")]
    pub first: Duration,
    /// Upper bound for any delay.
    #[serde(with = "millis")]
    pub max: Duration,
    /// Growth factor between consecutive attempts.
    pub factor: f64,
    /// Randomization applied to the capped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 1s`, `factor = 2.0`, `max = 30s`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Delay before reconnect attempt `attempt` (0-indexed).
    ///
    /// Non-finite or negative intermediate values clamp to [`BackoffPolicy::max`].
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
