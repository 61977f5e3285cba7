//! Reconnect policies.
//!
//! ## Contents
//! - [`BackoffPolicy`] how reconnect delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized reconnects
//!
//! ## Wiring
//! ```text
//! Config { backoff: BackoffPolicy, .. }
//!      └─► core::supervisor uses backoff.next(attempt) between connection attempts;
//!          attempt resets to 0 once a connection reaches open
//! ```

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub(crate) use backoff::millis;
pub use jitter::JitterPolicy;
