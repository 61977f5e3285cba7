//! # Runtime observers.
//!
//! This module provides the [`Observe`] trait, the `ObserverSet` fan-out that
//! drives observers, and built-in implementations.
//!
//! ## Architecture
//! ```text
//! Supervisor / loops ── emit(RuntimeEvent) ──► ObserverSet
//!                                                 │
//!                                     ┌───────────┼────────────┐
//!                                     ▼           ▼            ▼
//!                                 LogWriter   ObserveFn     Custom
//! ```
//!
//! Emitting never blocks the core: each observer owns a bounded queue and a
//! worker task; overflow drops the event for that observer only.

#[cfg(feature = "logging")]
mod log;
mod observe;
mod observe_fn;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observe::Observe;
pub use observe_fn::ObserveFn;
pub(crate) use set::ObserverSet;
