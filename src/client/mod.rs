//! Per-event-type dispatch on top of [`Jetstream::stream`](crate::Jetstream::stream).
//!
//! ## Contents
//! - [`JetstreamClient`] handler registry and the `run` loop
//! - [`TypedCommit`] create/update event with its record decoded into a [`Record`](crate::records::Record)
//! - [`HandlerError`] what a handler may fail with
//!
//! ## Dispatch
//! ```text
//! stream ──► event ──► handler 1 (matches?) ──► await
//!                  ├─► handler 2 (matches?) ──► await
//!                  └─► ...                       (registration order)
//! ```
//! A record that fails validation skips that handler with a warning. A handler
//! error or panic is logged; dispatch continues with the next handler.

mod dispatch;
mod handler;

pub use dispatch::JetstreamClient;
pub use handler::{HandlerError, TypedCommit};
