//! # jetstream
//!
//! **jetstream** is a reconnecting client for the Bluesky Jetstream firehose.
//!
//! It keeps one WebSocket connection alive, decodes every inbound frame into a
//! typed [`JetstreamMessage`], buffers events under a bounded overflow policy,
//! and delivers outbound control messages exactly once across reconnects.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                 JetstreamBuilder::new(Config).build()
//!                                │
//! ┌──────────────────────────────▼────────────────────────────────────┐
//! │  Jetstream (public handle)                                        │
//! │  - stream()          ◄── Mailbox (Suspend | Dropping | Sliding)   │
//! │  - send()            ──► Outbound queue + single pending slot     │
//! │  - update_options()  ──► validated send                           │
//! │  - shutdown()        ──► cancel, fail outstanding sends, end      │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  ConnectionSupervisor (background task)                           │
//! │  connect ─► Open ─► select! { read loop, write loop } ─► Failed   │
//! │     ▲                                                    │        │
//! │     └───────────── backoff (1s, 2s, 4s, ... ≤ 30s) ◄─────┘        │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                │ RuntimeEvent
//!                                ▼
//!                          ObserverSet ──► LogWriter / ObserveFn / custom
//! ```
//!
//! ### Guarantees
//! - Inbound events keep wire order; malformed frames are dropped and reported.
//! - A `send` resolves only after the transport confirmed the write. A message
//!   interrupted by a connection failure is retried on the next connection.
//! - After `shutdown`, every outstanding `send` fails with
//!   `Connection Closed: Jetstream shutdown` and every stream ends.
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                                 |
//! |-------------------|-----------------------------------------------------------|----------------------------------------------------|
//! | **Client**        | Connection lifecycle, stream, control messages.           | [`Jetstream`], [`JetstreamBuilder`], [`Config`]    |
//! | **Messages**      | Typed events and outbound control messages.               | [`JetstreamMessage`], [`SubscriberSourcedMessage`] |
//! | **Dispatch**      | Per-kind and per-collection handlers.                     | [`JetstreamClient`], [`records`]                   |
//! | **Observers**     | Hook into runtime events (logging, metrics, tests).       | [`Observe`], [`ObserveFn`], [`RuntimeEvent`]       |
//! | **Policies**      | Reconnect backoff and jitter.                             | [`BackoffPolicy`], [`JitterPolicy`]                |
//! | **Errors**        | Typed, labelled failures.                                 | [`JetstreamError`], [`ConnectionError`]            |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] observer.
//!
//! ## Example
//! ```no_run
//! use futures::StreamExt;
//! use jetstream::{Config, JetstreamBuilder, OptionsUpdate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), jetstream::JetstreamError> {
//!     let cfg = Config {
//!         wanted_collections: vec!["app.bsky.feed.post".into()],
//!         ..Config::default()
//!     };
//!     let client = JetstreamBuilder::new(cfg).build()?;
//!
//!     let mut events = client.stream();
//!     while let Some(event) = events.next().await {
//!         let event = event?;
//!         println!("{} {}", event.tag(), event.did());
//!         if event.time_us() > 0 {
//!             break;
//!         }
//!     }
//!
//!     client
//!         .update_options(OptionsUpdate::default().with_collections(["app.bsky.feed.like"]))
//!         .await?;
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```
mod client;
mod core;
mod error;
mod events;
mod message;
mod observers;
mod policies;
mod transport;

pub mod records;

// ---- Public re-exports ----

pub use crate::core::{
    BufferStrategy, Config, DEFAULT_ENDPOINT, EventStream, Jetstream, JetstreamBuilder,
};
pub use client::{HandlerError, JetstreamClient, TypedCommit};
pub use error::{
    ConnectionError, ConnectionReason, JetstreamError, ParseError, RAW_SNIPPET_LEN,
    SubscriptionError, SubscriptionReason,
};
pub use events::{RuntimeEvent, RuntimeEventKind};
pub use message::{
    Account, AccountEvent, AccountStatus, CommitEvent, CommitInfo, DeleteEvent, DeleteInfo, Did,
    EventKind, FrameDecoder, Identity, IdentityEvent, InvalidDid, JetstreamMessage,
    MAX_WANTED_COLLECTIONS, MAX_WANTED_DIDS, Operation, OptionsUpdate, SubscriberSourcedMessage,
    decode_frame, decode_message,
};
pub use observers::{Observe, ObserveFn};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use transport::{
    Connect, Connection, Frame, FrameSink, FrameStream, WebSocketConnector, build_url,
};

// Optional: expose the built-in logging observer.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
