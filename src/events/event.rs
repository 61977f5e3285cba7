//! # Runtime events emitted by the connection supervisor.
//!
//! [`RuntimeEventKind`] is a closed enum over everything the core reports:
//! - **Connection lifecycle**: attempt, opened, closed, shutdown
//! - **Inbound pipeline**: decode failures, dropped/evicted messages
//! - **Outbound pipeline**: queued, encoded, encode failure, sent
//!
//! Events are purely observational; nothing in the core reads them back.
//!
//! ## Ordering guarantees
//! Each event carries a process-wide sequence number (`seq`) that increases
//! monotonically. Observers run on separate workers, so use `seq` to restore
//! emission order across observers.
//!
//! ## Example
//! ```rust
//! use jetstream::{ConnectionReason, RuntimeEvent, RuntimeEventKind};
//!
//! let ev = RuntimeEvent::new(RuntimeEventKind::ConnectionClosed {
//!     reason: ConnectionReason::Timeout,
//!     cause: None,
//! });
//! assert_eq!(ev.kind.label(), "connection_closed");
//! assert!(RuntimeEvent::new(RuntimeEventKind::Shutdown).seq > ev.seq);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConnectionReason;
use crate::message::{Did, EventKind};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEventKind {
    // === Connection lifecycle ===
    /// A connection attempt is starting.
    ConnectionAttempt {
        url: Arc<str>,
        /// Attempts since the last connection that reached open (0-based).
        attempt: u32,
    },

    /// The physical connection is open; read and write loops are running.
    ConnectionOpened { url: Arc<str> },

    /// The connection (or the attempt) ended; a reconnect follows unless shutting down.
    ConnectionClosed {
        reason: ConnectionReason,
        cause: Option<Arc<str>>,
    },

    // === Inbound pipeline ===
    /// A frame failed to decode and was skipped.
    DecodeFailed { message: Arc<str> },

    /// A decoded message was dropped (or evicted) by the inbound buffer.
    InboundDropped { kind: EventKind, did: Did },

    // === Outbound pipeline ===
    /// A control message was accepted into the outbound queue.
    OutboundQueued,

    /// The pending control message was encoded and is being written.
    OutboundEncoded,

    /// The pending control message failed to encode; it is not retried.
    OutboundEncodeFailed { message: Arc<str> },

    /// The transport confirmed the write of the pending control message.
    OutboundSent,

    // === Terminal ===
    /// Shutdown started.
    Shutdown,
}

impl RuntimeEventKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RuntimeEventKind::ConnectionAttempt { .. } => "connection_attempt",
            RuntimeEventKind::ConnectionOpened { .. } => "connection_opened",
            RuntimeEventKind::ConnectionClosed { .. } => "connection_closed",
            RuntimeEventKind::DecodeFailed { .. } => "decode_failed",
            RuntimeEventKind::InboundDropped { .. } => "inbound_dropped",
            RuntimeEventKind::OutboundQueued => "outbound_queued",
            RuntimeEventKind::OutboundEncoded => "outbound_encoded",
            RuntimeEventKind::OutboundEncodeFailed { .. } => "outbound_encode_failed",
            RuntimeEventKind::OutboundSent => "outbound_sent",
            RuntimeEventKind::Shutdown => "shutdown",
        }
    }
}

/// Runtime event: kind plus ordering metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification and payload.
    pub kind: RuntimeEventKind,
}

impl RuntimeEvent {
    /// Creates an event with the current timestamp and the next sequence number.
    pub fn new(kind: RuntimeEventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
        }
    }

    /// Milliseconds since the Unix epoch (0 if the clock is before it).
    #[inline]
    pub fn timestamp_ms(&self) -> u64 {
        self.at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
            .unwrap_or(0)
    }

    #[inline]
    pub(crate) fn attempt(url: &Arc<str>, attempt: u32) -> Self {
        Self::new(RuntimeEventKind::ConnectionAttempt {
            url: Arc::clone(url),
            attempt,
        })
    }

    #[inline]
    pub(crate) fn opened(url: &Arc<str>) -> Self {
        Self::new(RuntimeEventKind::ConnectionOpened {
            url: Arc::clone(url),
        })
    }

    #[inline]
    pub(crate) fn closed(err: &crate::error::ConnectionError) -> Self {
        Self::new(RuntimeEventKind::ConnectionClosed {
            reason: err.reason,
            cause: err.cause.clone(),
        })
    }

    #[inline]
    pub(crate) fn decode_failed(message: &str) -> Self {
        Self::new(RuntimeEventKind::DecodeFailed {
            message: message.into(),
        })
    }

    #[inline]
    pub(crate) fn inbound_dropped(msg: &crate::message::JetstreamMessage) -> Self {
        Self::new(RuntimeEventKind::InboundDropped {
            kind: msg.kind(),
            did: msg.did().clone(),
        })
    }

    #[inline]
    pub(crate) fn encode_failed(message: &str) -> Self {
        Self::new(RuntimeEventKind::OutboundEncodeFailed {
            message: message.into(),
        })
    }
}
