//! # Physical transport.
//!
//! The supervisor talks to the server through the [`Connect`] trait. A successful
//! connect yields a [`Connection`]: a sink of outbound text frames and a stream of
//! inbound [`Frame`]s.
//!
//! ```text
//! Connect::connect(url) ──► Connection { sink: FrameSink, stream: FrameStream }
//!                                          ▲                 │
//!                              write loop ─┘                 └─► read loop
//! ```
//!
//! ## Rules
//! - Transport errors are reported as [`ConnectionError`]; the supervisor turns
//!   every one of them into a reconnect.
//! - A stream that ends means the remote closed the connection.
//! - Control frames (ping/pong) never reach the stream.

mod url;
mod websocket;

#[cfg(test)]
pub(crate) mod fake;

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Sink, stream::BoxStream};

use crate::error::ConnectionError;

pub use self::url::build_url;
pub use websocket::WebSocketConnector;

/// One inbound data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Outbound half of a connection.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = ConnectionError> + Send>>;

/// Inbound half of a connection.
pub type FrameStream = BoxStream<'static, Result<Frame, ConnectionError>>;

/// An open physical connection.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens physical connections.
///
/// Implemented by [`WebSocketConnector`]; tests substitute an in-memory transport.
#[async_trait]
pub trait Connect: Send + Sync + 'static {
    /// Opens a connection to `url`.
    ///
    /// The supervisor bounds this call with the configured connect timeout.
    async fn connect(&self, url: &::url::Url) -> Result<Connection, ConnectionError>;
}
