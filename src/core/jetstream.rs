//! # Jetstream: the public client handle.
//!
//! A [`Jetstream`] owns a background connection supervisor and exposes the
//! logical stream on top of it.
//!
//! ## Operations
//! - [`Jetstream::stream`] decoded events in wire order; ends after shutdown
//! - [`Jetstream::send`] queue a control message, resolve once written
//! - [`Jetstream::update_options`] validated `options_update` shorthand
//! - [`Jetstream::shutdown`] idempotent, terminal
//!
//! ## Shutdown path
//! ```text
//! shutdown()
//!   └─► publish Shutdown
//!   └─► runtime_token.cancel()      → connect / loops / backoff sleep abort
//!   └─► spawn cleanup task (once) ──┐
//!   └─► await cleanup task          │
//!                                   ├─► await supervisor task
//!                                   ├─► outbound.close_and_fail() → pending + queued
//!                                   │     handles fail with "Connection Closed: Jetstream shutdown"
//!                                   └─► mailbox.end()             → streams finish after draining
//! ```
//!
//! The cleanup runs on its own task, so dropping a `shutdown()` future
//! midway does not leave streams or sends hanging.
//!
//! Dropping the handle without calling `shutdown` cancels the supervisor and
//! ends the mailbox; outstanding `send` calls then fail with the same error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::{select, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{connection::Shared, mailbox::EventStream};
use crate::{
    error::{ConnectionError, JetstreamError},
    events::{RuntimeEvent, RuntimeEventKind},
    message::{OptionsUpdate, SubscriberSourcedMessage},
};

/// Client handle. Create it with [`JetstreamBuilder`](crate::JetstreamBuilder).
pub struct Jetstream {
    shared: Arc<Shared>,
    runtime_token: CancellationToken,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
    shutdown_started: AtomicBool,
    /// Cancelled by the cleanup task once shutdown has fully completed.
    shutdown_complete: CancellationToken,
}

impl Jetstream {
    pub(crate) fn new_internal(
        shared: Arc<Shared>,
        runtime_token: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            shared,
            runtime_token,
            task: parking_lot::Mutex::new(Some(task)),
            shutdown_started: AtomicBool::new(false),
            shutdown_complete: CancellationToken::new(),
        }
    }

    /// Decoded events in wire order.
    ///
    /// Every call returns a new stream over the same buffer; concurrent streams
    /// compete for messages. Malformed frames never appear here. The stream ends
    /// after shutdown once the buffer is drained.
    pub fn stream(&self) -> EventStream {
        self.shared.mailbox.stream()
    }

    /// Queues a control message and waits until the transport confirmed the write.
    ///
    /// A message interrupted by a connection failure is retried on the next
    /// connection. Fails with the message's [`ParseError`](crate::ParseError) if it
    /// cannot be encoded, or with `Connection Closed: Jetstream shutdown` if
    /// shutdown happens first.
    pub async fn send(
        &self,
        message: impl Into<SubscriberSourcedMessage>,
    ) -> Result<(), JetstreamError> {
        if self.runtime_token.is_cancelled() {
            return Err(ConnectionError::shutdown().into());
        }
        let reply = select! {
            biased;
            _ = self.runtime_token.cancelled() => return Err(ConnectionError::shutdown().into()),
            res = self.shared.outbound.enqueue(message.into()) => res?,
        };
        self.shared
            .emit(RuntimeEvent::new(RuntimeEventKind::OutboundQueued));

        match reply.await {
            Ok(result) => result,
            Err(_closed) => Err(ConnectionError::shutdown().into()),
        }
    }

    /// Sends an `options_update` after checking it against the server limits.
    pub async fn update_options(&self, update: OptionsUpdate) -> Result<(), JetstreamError> {
        update.validate()?;
        self.send(update).await
    }

    /// Stops the client. Idempotent; concurrent callers wait for the first to finish.
    ///
    /// Once started, shutdown completes even if this future is dropped.
    pub async fn shutdown(&self) {
        if !self.shutdown_started.swap(true, Ordering::AcqRel) {
            self.shared.emit(RuntimeEvent::new(RuntimeEventKind::Shutdown));
            info!("jetstream shutting down");
            self.runtime_token.cancel();

            let supervisor = self.task.lock().take();
            tokio::spawn(finish_shutdown(
                Arc::clone(&self.shared),
                supervisor,
                self.shutdown_complete.clone(),
            ));
        }
        self.shutdown_complete.cancelled().await;
    }

    /// True once shutdown has started.
    pub fn is_shutdown(&self) -> bool {
        self.runtime_token.is_cancelled()
    }
}

async fn finish_shutdown(
    shared: Arc<Shared>,
    supervisor: Option<JoinHandle<()>>,
    complete: CancellationToken,
) {
    let _complete = complete.drop_guard();
    if let Some(task) = supervisor {
        if let Err(e) = task.await {
            warn!(error = %e, "connection supervisor did not stop cleanly");
        }
    }

    let failed = shared.outbound.close_and_fail().await;
    shared.mailbox.end();
    debug!(failed_sends = failed, "jetstream shut down");
}

impl Drop for Jetstream {
    fn drop(&mut self) {
        self.runtime_token.cancel();
        self.shared.mailbox.end();
    }
}
