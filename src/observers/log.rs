//! # Logging observer.
//!
//! [`LogWriter`] renders every [`RuntimeEvent`] through `tracing`, one line per
//! event, with the level chosen by how interesting the event is:
//!
//! ```text
//! DEBUG connection attempt  url=wss://.../subscribe attempt=0
//! INFO  connection opened   url=wss://.../subscribe
//! WARN  connection closed   reason=closed cause="remote close 1000: "
//! WARN  decode failed       message="Schema validation failed: ..."
//! DEBUG inbound dropped     kind=commit did=did:plc:...
//! DEBUG outbound sent
//! INFO  shutdown
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{RuntimeEvent, RuntimeEventKind};
use crate::observers::Observe;

/// `tracing`-backed observer for demos and debugging.
///
/// Enabled via the `logging` feature.
pub struct LogWriter;

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &RuntimeEvent) {
        let seq = e.seq;
        match &e.kind {
            RuntimeEventKind::ConnectionAttempt { url, attempt } => {
                debug!(seq, url = %url, attempt, "connection attempt");
            }
            RuntimeEventKind::ConnectionOpened { url } => {
                info!(seq, url = %url, "connection opened");
            }
            RuntimeEventKind::ConnectionClosed { reason, cause } => {
                warn!(seq, reason = %reason, cause = ?cause, "connection closed");
            }
            RuntimeEventKind::DecodeFailed { message } => {
                warn!(seq, message = %message, "decode failed");
            }
            RuntimeEventKind::InboundDropped { kind, did } => {
                debug!(seq, kind = %kind, did = %did, "inbound dropped");
            }
            RuntimeEventKind::OutboundQueued
            | RuntimeEventKind::OutboundEncoded
            | RuntimeEventKind::OutboundSent => {
                debug!(seq, event = e.kind.label(), "outbound");
            }
            RuntimeEventKind::OutboundEncodeFailed { message } => {
                warn!(seq, message = %message, "outbound encode failed");
            }
            RuntimeEventKind::Shutdown => {
                info!(seq, "shutdown");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
