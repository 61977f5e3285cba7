//! # Client configuration.
//!
//! Provides [`Config`], the settings a [`JetstreamBuilder`](crate::JetstreamBuilder)
//! validates and freezes when it builds a client.
//!
//! ## Sentinel values
//! - `inbound_buffer_size = 0` / `outbound_buffer_size = 0` → clamped to 1
//! - `connect_timeout = 0s` → no connect timeout
//!
//! `Config` implements `Deserialize` with every field defaulted, so applications
//! can load it from a file and override only what they need. Durations are
//! given in milliseconds.

use std::time::Duration;

use serde::Deserialize;

use crate::core::mailbox::BufferStrategy;
use crate::error::{SubscriptionError, SubscriptionReason};
use crate::message::check_filter_limits;
use crate::policies::{BackoffPolicy, millis};

/// Public endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "wss://jetstream1.us-east.bsky.network/subscribe";

/// Client configuration.
///
/// ## Field semantics
/// - `endpoint`: WebSocket URL of the subscribe endpoint (no query string needed)
/// - `wanted_collections` / `wanted_dids`: server-side filters (empty = everything)
/// - `cursor`: resume point in microseconds; forwarded into the URL, never persisted
/// - `compress`: ask the server for zstd frames (requires a frame decoder)
/// - `inbound_buffer_size` / `inbound_buffer_strategy`: decoded-message buffer
/// - `outbound_buffer_size`: queued control messages
/// - `connect_timeout`: bound on a single connection attempt
/// - `backoff`: delay schedule between attempts
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub endpoint: String,
    pub wanted_collections: Vec<String>,
    pub wanted_dids: Vec<String>,
    pub cursor: Option<i64>,
    pub max_message_size_bytes: Option<u64>,
    pub compress: bool,
    pub inbound_buffer_size: usize,
    pub inbound_buffer_strategy: BufferStrategy,
    pub outbound_buffer_size: usize,
    #[serde(with = "millis")]
    pub connect_timeout: Duration,
    pub backoff: BackoffPolicy,
}

impl Config {
    /// Checks the subscription against the server limits.
    ///
    /// - negative `cursor` → `InvalidCursor`
    /// - more than 100 collections → `TooManyCollections`
    /// - more than 10 000 DIDs → `TooManyDids`
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        if self.cursor.is_some_and(|c| c < 0) {
            return Err(SubscriptionError::new(SubscriptionReason::InvalidCursor));
        }
        check_filter_limits(&self.wanted_collections, &self.wanted_dids)
    }

    /// Inbound buffer capacity clamped to a minimum of 1.
    #[inline]
    pub fn inbound_capacity(&self) -> usize {
        self.inbound_buffer_size.max(1)
    }

    /// Outbound queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn outbound_capacity(&self) -> usize {
        self.outbound_buffer_size.max(1)
    }

    /// Connect timeout as an `Option` (`None` = wait indefinitely).
    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        if self.connect_timeout == Duration::ZERO {
            None
        } else {
            Some(self.connect_timeout)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - public US-East endpoint, no filters, no cursor
    /// - `inbound_buffer_size = 4096`, `Suspend` on overflow
    /// - `outbound_buffer_size = 1024`
    /// - `connect_timeout = 10s`
    /// - `backoff = BackoffPolicy::default()` (1s doubling to 30s)
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            wanted_collections: Vec::new(),
            wanted_dids: Vec::new(),
            cursor: None,
            max_message_size_bytes: None,
            compress: false,
            inbound_buffer_size: 4096,
            inbound_buffer_strategy: BufferStrategy::Suspend,
            outbound_buffer_size: 1024,
            connect_timeout: Duration::from_secs(10),
            backoff: BackoffPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.inbound_capacity(), 4096);
        assert_eq!(cfg.outbound_capacity(), 1024);
        assert_eq!(cfg.inbound_buffer_strategy, BufferStrategy::Suspend);
        assert_eq!(cfg.connect_timeout(), Some(Duration::from_secs(10)));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn sentinels_are_clamped() {
        let cfg = Config {
            inbound_buffer_size: 0,
            outbound_buffer_size: 0,
            connect_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.inbound_capacity(), 1);
        assert_eq!(cfg.outbound_capacity(), 1);
        assert_eq!(cfg.connect_timeout(), None);
    }

    #[test]
    fn negative_cursor_is_rejected() {
        let cfg = Config {
            cursor: Some(-1),
            ..Config::default()
        };
        assert_eq!(
            cfg.validate().map_err(|e| e.reason),
            Err(SubscriptionReason::InvalidCursor)
        );
    }

    #[test]
    fn filter_limits() {
        let cfg = Config {
            wanted_dids: (0..=10_000).map(|i| format!("did:plc:{i}")).collect(),
            ..Config::default()
        };
        assert_eq!(
            cfg.validate().map_err(|e| e.reason),
            Err(SubscriptionReason::TooManyDids)
        );

        let cfg = Config {
            wanted_collections: (0..100).map(|i| format!("app.test.c{i}")).collect(),
            ..Config::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserializes_partial_config() {
        let cfg: Config = serde_json::from_str(
            r#"{
                "wantedCollections": ["app.bsky.feed.post"],
                "inboundBufferStrategy": "sliding",
                "connectTimeout": 2500,
                "backoff": {"max": 5000}
            }"#,
        )
        .expect("valid config");
        assert_eq!(cfg.wanted_collections, vec!["app.bsky.feed.post"]);
        assert_eq!(cfg.inbound_buffer_strategy, BufferStrategy::Sliding);
        assert_eq!(cfg.connect_timeout, Duration::from_millis(2500));
        assert_eq!(cfg.backoff.max, Duration::from_secs(5));
        assert_eq!(cfg.backoff.first, Duration::from_secs(1));
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    }
}
