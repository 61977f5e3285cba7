//! Runtime events: the data model observers receive.
//!
//! ## Contents
//! - [`RuntimeEvent`], [`RuntimeEventKind`] event classification and payload
//!
//! ## Quick reference
//! - **Publishers**: the connection supervisor, read/write loops, `Jetstream::send`
//!   and `Jetstream::shutdown`.
//! - **Consumers**: the internal `ObserverSet`, which fans each
//!   event out to the configured observers.

mod event;

pub use event::{RuntimeEvent, RuntimeEventKind};
