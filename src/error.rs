//! Error types used by the Jetstream runtime.
//!
//! This module defines the error taxonomy:
//!
//! - [`ConnectionError`]: transport-level failures (connect, timeout, close).
//! - [`ParseError`]: message-level failures (malformed frame, schema violation,
//!   decompression failure, outbound encode failure).
//! - [`SubscriptionError`]: configuration-level failures (cursor, filter limits).
//! - [`JetstreamError`]: the union of the three, returned by public operations.
//!
//! Every type provides `as_label` (stable snake_case label for logs/metrics).

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Maximum number of characters of a raw frame kept on a [`ParseError`].
pub const RAW_SNIPPET_LEN: usize = 200;

/// Reason attached to a [`ConnectionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionReason {
    /// The connection attempt failed.
    Connect,
    /// The connection attempt did not complete in time.
    Timeout,
    /// The connection was closed (remotely, locally, or by shutdown).
    Closed,
    /// Informational: a reconnect is in progress.
    Reconnecting,
}

impl ConnectionReason {
    /// Returns the reason as it appears in runtime events and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionReason::Connect => "Connect",
            ConnectionReason::Timeout => "Timeout",
            ConnectionReason::Closed => "Closed",
            ConnectionReason::Reconnecting => "Reconnecting",
        }
    }
}

impl fmt::Display for ConnectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Transport-level failure.
///
/// Inside an open connection these are always recovered by the reconnect loop;
/// callers only see them through `send` handles after shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionError {
    /// Classification of the failure.
    pub reason: ConnectionReason,
    /// Rendered underlying cause, if any.
    pub cause: Option<Arc<str>>,
}

impl ConnectionError {
    /// Creates an error without a cause.
    pub fn new(reason: ConnectionReason) -> Self {
        Self {
            reason,
            cause: None,
        }
    }

    /// Creates an error carrying a rendered cause.
    pub fn with_cause(reason: ConnectionReason, cause: impl fmt::Display) -> Self {
        Self {
            reason,
            cause: Some(cause.to_string().into()),
        }
    }

    /// Shorthand for a `Connect` failure.
    pub fn connect(cause: impl fmt::Display) -> Self {
        Self::with_cause(ConnectionReason::Connect, cause)
    }

    /// Shorthand for a `Closed` failure.
    pub fn closed(cause: impl fmt::Display) -> Self {
        Self::with_cause(ConnectionReason::Closed, cause)
    }

    /// The error every outstanding `send` receives when the client shuts down.
    pub fn shutdown() -> Self {
        Self::closed("Jetstream shutdown")
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jetstream::{ConnectionError, ConnectionReason};
    ///
    /// let err = ConnectionError::new(ConnectionReason::Timeout);
    /// assert_eq!(err.as_label(), "connection_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self.reason {
            ConnectionReason::Connect => "connection_connect",
            ConnectionReason::Timeout => "connection_timeout",
            ConnectionReason::Closed => "connection_closed",
            ConnectionReason::Reconnecting => "connection_reconnecting",
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "Connection {}: {cause}", self.reason),
            None => write!(f, "Connection {}", self.reason),
        }
    }
}

impl std::error::Error for ConnectionError {}

/// # Message-level failure.
///
/// Carries a human-readable message and, when available, a snippet of the raw
/// input bounded by [`RAW_SNIPPET_LEN`] characters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    /// Human-readable description.
    pub message: String,
    /// Truncated raw input, for diagnostics.
    pub raw: Option<String>,
}

impl ParseError {
    /// Creates a parse error without a raw snippet.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raw: None,
        }
    }

    /// Attaches a snippet of `raw`, truncated to [`RAW_SNIPPET_LEN`] characters.
    pub fn with_raw(mut self, raw: &str) -> Self {
        self.raw = Some(raw.chars().take(RAW_SNIPPET_LEN).collect());
        self
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "parse_failed"
    }
}

/// Reason attached to a [`SubscriptionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionReason {
    /// The cursor cannot be used as a resume position.
    InvalidCursor,
    /// More collections requested than the server accepts.
    TooManyCollections,
    /// More DIDs requested than the server accepts.
    TooManyDids,
}

impl fmt::Display for SubscriptionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubscriptionReason::InvalidCursor => "InvalidCursor",
            SubscriptionReason::TooManyCollections => "TooManyCollections",
            SubscriptionReason::TooManyDids => "TooManyDids",
        })
    }
}

/// # Configuration-level failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Subscription error: {reason}")]
pub struct SubscriptionError {
    /// Classification of the failure.
    pub reason: SubscriptionReason,
}

impl SubscriptionError {
    /// Creates a subscription error.
    pub fn new(reason: SubscriptionReason) -> Self {
        Self { reason }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self.reason {
            SubscriptionReason::InvalidCursor => "subscription_invalid_cursor",
            SubscriptionReason::TooManyCollections => "subscription_too_many_collections",
            SubscriptionReason::TooManyDids => "subscription_too_many_dids",
        }
    }
}

/// # Any error surfaced by the public API.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JetstreamError {
    /// Transport-level failure.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// Message-level failure.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Configuration-level failure.
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
}

impl JetstreamError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jetstream::{JetstreamError, ParseError};
    ///
    /// let err = JetstreamError::from(ParseError::new("bad frame"));
    /// assert_eq!(err.as_label(), "parse_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            JetstreamError::Connection(e) => e.as_label(),
            JetstreamError::Parse(e) => e.as_label(),
            JetstreamError::Subscription(e) => e.as_label(),
        }
    }

    /// True if this is the closed-connection error produced by shutdown or a dropped socket.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            JetstreamError::Connection(ConnectionError {
                reason: ConnectionReason::Closed,
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_message_includes_cause() {
        let err = ConnectionError::closed("boom");
        assert_eq!(err.to_string(), "Connection Closed: boom");

        let bare = ConnectionError::new(ConnectionReason::Connect);
        assert_eq!(bare.to_string(), "Connection Connect");
    }

    #[test]
    fn raw_snippet_is_bounded() {
        let raw = "x".repeat(1_000);
        let err = ParseError::new("bad").with_raw(&raw);
        assert_eq!(err.raw.as_deref().map(str::len), Some(RAW_SNIPPET_LEN));
    }

    #[test]
    fn raw_snippet_respects_char_boundaries() {
        let raw = "é".repeat(300);
        let err = ParseError::new("bad").with_raw(&raw);
        assert_eq!(err.raw.map(|r| r.chars().count()), Some(RAW_SNIPPET_LEN));
    }

    #[test]
    fn labels_are_stable() {
        let sub = JetstreamError::from(SubscriptionError::new(SubscriptionReason::TooManyDids));
        assert_eq!(sub.as_label(), "subscription_too_many_dids");
        assert_eq!(sub.to_string(), "Subscription error: TooManyDids");
        assert!(JetstreamError::from(ConnectionError::shutdown()).is_closed());
    }
}
