//! Runtime core: connection lifecycle, buffering, and delivery.
//!
//! The public API from this module is [`Jetstream`], [`JetstreamBuilder`] and
//! [`Config`]; everything else is wiring between them.
//!
//! Internal modules:
//! - [`connection`]: runs one connection attempt (connect, read loop, write loop);
//! - [`supervisor`]: reconnect loop with backoff;
//! - [`mailbox`]: bounded inbound buffer with overflow strategies;
//! - [`outbound`]: outbound queue with the single pending slot;
//! - [`jetstream`]: the public handle and shutdown path.
//!
//! ## Wiring
//! ```text
//!                  ┌────────────── ConnectionSupervisor (task) ──────────────┐
//!                  │  run_once ─► connect ─► select! { read_loop, write_loop } │
//!                  └──────┬─────────────────────────────▲────────────────────┘
//!                         │ offer                        │ claim / complete
//!                         ▼                              │
//! Jetstream::stream ◄── Mailbox                  Outbound ◄── Jetstream::send
//!                         │                              │
//!                         └────────── ObserverSet ◄──────┘  (RuntimeEvent fan-out)
//! ```

mod builder;
mod config;
mod connection;
mod jetstream;
mod mailbox;
mod outbound;
mod supervisor;


pub use builder::JetstreamBuilder;
pub use config::{Config, DEFAULT_ENDPOINT};
pub use jetstream::Jetstream;
pub use mailbox::{BufferStrategy, EventStream};
