//! In-memory transport for tests.
//!
//! ```text
//! FakeConnector::connect(url) ──► PendingSocket (held by the test)
//!                                     │ open()            │ reject()/drop
//!                                     ▼                   ▼
//!                                 FakeSocket          ConnectionError::Connect
//!                                  push_text / push_binary / fail / close
//!                                  next_written / fail_next_write
//! ```
//!
//! `connect` does not return until the test opens or rejects the pending socket,
//! so tests decide exactly when a connection reaches open.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, sink, stream};
use tokio::sync::{mpsc, oneshot};
use url::Url;

use super::{Connect, Connection, Frame};
use crate::error::ConnectionError;

/// Test-side handle on the sequence of connection attempts.
pub(crate) struct FakeServer {
    attempts: mpsc::UnboundedReceiver<PendingSocket>,
}

impl FakeServer {
    /// Waits for the next connection attempt.
    pub(crate) async fn next_attempt(&mut self) -> PendingSocket {
        match tokio::time::timeout(Duration::from_secs(120), self.attempts.recv()).await {
            Ok(Some(pending)) => pending,
            Ok(None) => panic!("connector dropped"),
            Err(_) => panic!("no connection attempt"),
        }
    }

    /// Waits for the next attempt and opens it.
    pub(crate) async fn accept(&mut self) -> FakeSocket {
        self.next_attempt().await.open()
    }

    /// Returns an attempt that is already waiting, if any.
    pub(crate) fn try_next_attempt(&mut self) -> Option<PendingSocket> {
        self.attempts.try_recv().ok()
    }
}

/// [`Connect`] implementation backed by channels.
pub(crate) struct FakeConnector {
    attempts: mpsc::UnboundedSender<PendingSocket>,
}

impl FakeConnector {
    pub(crate) fn new() -> (Self, FakeServer) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { attempts: tx }, FakeServer { attempts: rx })
    }
}

#[async_trait]
impl Connect for FakeConnector {
    async fn connect(&self, url: &Url) -> Result<Connection, ConnectionError> {
        let (tx, rx) = oneshot::channel();
        let pending = PendingSocket {
            url: url.clone(),
            reply: tx,
        };
        if self.attempts.send(pending).is_err() {
            return Err(ConnectionError::connect("fake server gone"));
        }
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::connect("connection refused")),
        }
    }
}

/// A connection attempt waiting for the test to decide its outcome.
pub(crate) struct PendingSocket {
    pub(crate) url: Url,
    reply: oneshot::Sender<Result<Connection, ConnectionError>>,
}

impl PendingSocket {
    /// Completes the attempt with an open connection.
    pub(crate) fn open(self) -> FakeSocket {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel::<Result<Frame, ConnectionError>>();
        let (written_tx, written_rx) = mpsc::unbounded_channel::<String>();
        let fail_write = Arc::new(AtomicBool::new(false));

        let inbound = stream::unfold(frames_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed();

        let outbound = sink::unfold(
            (written_tx, Arc::clone(&fail_write)),
            |(tx, fail), text: String| async move {
                if fail.swap(false, Ordering::SeqCst) {
                    return Err(ConnectionError::closed("write failed"));
                }
                match tx.send(text) {
                    Ok(()) => Ok((tx, fail)),
                    Err(_) => Err(ConnectionError::closed("socket dropped")),
                }
            },
        );

        let connection = Connection {
            sink: Box::pin(outbound),
            stream: inbound,
        };
        let _ = self.reply.send(Ok(connection));
        FakeSocket {
            frames: Some(frames_tx),
            written: written_rx,
            fail_write,
        }
    }

    /// Completes the attempt with a connect failure.
    pub(crate) fn reject(self, cause: &str) {
        let _ = self.reply.send(Err(ConnectionError::connect(cause.to_string())));
    }
}

/// Test-side handle on an open connection.
pub(crate) struct FakeSocket {
    frames: Option<mpsc::UnboundedSender<Result<Frame, ConnectionError>>>,
    written: mpsc::UnboundedReceiver<String>,
    fail_write: Arc<AtomicBool>,
}

impl FakeSocket {
    fn push(&self, item: Result<Frame, ConnectionError>) {
        if let Some(tx) = &self.frames {
            let _ = tx.send(item);
        }
    }

    pub(crate) fn push_text(&self, text: &str) {
        self.push(Ok(Frame::Text(text.to_string())));
    }

    pub(crate) fn push_binary(&self, bytes: &[u8]) {
        self.push(Ok(Frame::Binary(bytes.to_vec())));
    }

    /// Fails the inbound stream, as a dropped socket would.
    pub(crate) fn fail(&self, cause: &str) {
        self.push(Err(ConnectionError::closed(cause.to_string())));
    }

    /// Ends the inbound stream, as a clean remote close would.
    pub(crate) fn close(&mut self) {
        self.frames = None;
    }

    /// Makes the next write fail with a closed-connection error.
    pub(crate) fn fail_next_write(&self) {
        self.fail_write.store(true, Ordering::SeqCst);
    }

    /// Waits for the next frame the client wrote.
    pub(crate) async fn next_written(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(120), self.written.recv())
            .await
            .ok()
            .flatten()
    }

    /// Returns a written frame if one is already there.
    pub(crate) fn try_written(&mut self) -> Option<String> {
        self.written.try_recv().ok()
    }
}
