//! # Outbound channel with a single pending slot.
//!
//! Control messages queued by `send` reach the wire through the write loop of
//! whichever connection is open. At most one message is *pending*: claimed from
//! the queue, possibly written, not yet confirmed.
//!
//! ```text
//! send() ─► [ mpsc queue (cap N) ] ─► claim() ─► [ pending slot ] ─► encode ─► sink
//!                                                    ▲                          │
//!                                                    └──── write failed ────────┘
//!                                                   (stays for the next connection)
//! ```
//!
//! ## Rules
//! - `claim` fills the slot with no suspension point between receiving from the
//!   queue and storing, so cancelling the write loop never loses a message.
//! - A populated slot is always retried before anything new is claimed.
//! - Every handle resolves exactly once: `complete`, `fail_pending`, or
//!   `close_and_fail` at shutdown.

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::{ConnectionError, JetstreamError, ParseError};
use crate::message::SubscriberSourcedMessage;

/// Completion handle side of an outbound message.
pub(crate) type Reply = oneshot::Receiver<Result<(), JetstreamError>>;

pub(crate) type Encoder = fn(&SubscriberSourcedMessage) -> Result<String, ParseError>;

/// A queued control message plus its completion handle.
#[derive(Debug)]
pub(crate) struct OutboundMessage {
    pub(crate) message: SubscriberSourcedMessage,
    reply: oneshot::Sender<Result<(), JetstreamError>>,
}

impl OutboundMessage {
    pub(crate) fn new(message: SubscriberSourcedMessage) -> (Self, Reply) {
        let (tx, rx) = oneshot::channel();
        (Self { message, reply: tx }, rx)
    }

    /// Resolves the handle; a caller that stopped waiting is ignored.
    fn resolve(self, result: Result<(), JetstreamError>) {
        let _ = self.reply.send(result);
    }
}

/// Outbound queue, pending slot and encoder.
pub(crate) struct Outbound {
    tx: Mutex<Option<mpsc::Sender<OutboundMessage>>>,
    rx: tokio::sync::Mutex<mpsc::Receiver<OutboundMessage>>,
    pending: Mutex<Option<OutboundMessage>>,
    encoder: Encoder,
}

impl Outbound {
    #[cfg(test)]
    pub(crate) fn new(capacity: usize) -> Self {
        Self::with_encoder(capacity, SubscriberSourcedMessage::encode)
    }

    pub(crate) fn with_encoder(capacity: usize, encoder: Encoder) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx: Mutex::new(Some(tx)),
            rx: tokio::sync::Mutex::new(rx),
            pending: Mutex::new(None),
            encoder,
        }
    }

    /// Queues `message`; waits for queue space when full.
    ///
    /// Fails with the shutdown error once the channel is closed.
    pub(crate) async fn enqueue(
        &self,
        message: SubscriberSourcedMessage,
    ) -> Result<Reply, JetstreamError> {
        let sender = self.tx.lock().clone();
        let Some(sender) = sender else {
            return Err(ConnectionError::shutdown().into());
        };
        let (msg, reply) = OutboundMessage::new(message);
        match sender.send(msg).await {
            Ok(()) => Ok(reply),
            Err(_) => Err(ConnectionError::shutdown().into()),
        }
    }

    /// Makes sure the pending slot is populated.
    ///
    /// Returns immediately if a message is already pending (retry); otherwise waits
    /// for the next queued message. Returns `false` once the queue is closed and empty.
    pub(crate) async fn claim(&self) -> bool {
        if self.pending.lock().is_some() {
            return true;
        }
        let mut rx = self.rx.lock().await;
        // A concurrent claim may have filled the slot while we waited for the lock.
        if self.pending.lock().is_some() {
            return true;
        }
        match rx.recv().await {
            Some(msg) => {
                *self.pending.lock() = Some(msg);
                true
            }
            None => false,
        }
    }

    /// Encodes the pending message, or returns `None` if the slot is empty.
    pub(crate) fn encode_pending(&self) -> Option<Result<String, ParseError>> {
        let slot = self.pending.lock();
        slot.as_ref().map(|m| (self.encoder)(&m.message))
    }

    /// Clears the slot and resolves it with success.
    pub(crate) fn complete(&self) {
        let msg = self.pending.lock().take();
        if let Some(msg) = msg {
            msg.resolve(Ok(()));
        }
    }

    /// Clears the slot and resolves it with `err` (no retry).
    pub(crate) fn fail_pending(&self, err: JetstreamError) {
        let msg = self.pending.lock().take();
        if let Some(msg) = msg {
            msg.resolve(Err(err));
        }
    }

    #[cfg(test)]
    pub(crate) fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Closes the channel and fails the pending message and every queued message
    /// with the shutdown error.
    ///
    /// The write loop must no longer be running.
    pub(crate) async fn close_and_fail(&self) -> usize {
        drop(self.tx.lock().take());
        let mut failed = 0;

        let pending = self.pending.lock().take();
        if let Some(msg) = pending {
            msg.resolve(Err(ConnectionError::shutdown().into()));
            failed += 1;
        }

        let mut rx = self.rx.lock().await;
        rx.close();
        while let Ok(msg) = rx.try_recv() {
            msg.resolve(Err(ConnectionError::shutdown().into()));
            failed += 1;
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::message::OptionsUpdate;

    fn update(collection: &str) -> SubscriberSourcedMessage {
        OptionsUpdate::default().with_collections([collection]).into()
    }

    fn collection_of(encoded: &str) -> String {
        let v: serde_json::Value = serde_json::from_str(encoded).expect("json");
        v["payload"]["wantedCollections"][0]
            .as_str()
            .expect("collection")
            .to_string()
    }

    #[tokio::test]
    async fn claim_fills_slot_and_complete_resolves() {
        let out = Outbound::new(8);
        let reply = out.enqueue(update("a.b.c")).await.expect("queued");

        assert!(out.claim().await);
        assert!(out.has_pending());
        let text = out.encode_pending().expect("pending").expect("encodes");
        assert_eq!(collection_of(&text), "a.b.c");

        out.complete();
        assert!(!out.has_pending());
        assert_eq!(reply.await.expect("resolved"), Ok(()));
    }

    #[tokio::test]
    async fn failed_write_keeps_message_for_retry() {
        let out = Outbound::new(8);
        let first = out.enqueue(update("first")).await.expect("queued");
        let _second = out.enqueue(update("second")).await.expect("queued");

        assert!(out.claim().await);
        let attempt1 = out.encode_pending().expect("pending").expect("encodes");
        // Write failed: nothing resolves the slot. The next claim must retry it.
        assert!(out.claim().await);
        let attempt2 = out.encode_pending().expect("pending").expect("encodes");
        assert_eq!(attempt1, attempt2);
        assert_eq!(collection_of(&attempt2), "first");

        out.complete();
        assert_eq!(first.await.expect("resolved"), Ok(()));

        assert!(out.claim().await);
        let next = out.encode_pending().expect("pending").expect("encodes");
        assert_eq!(collection_of(&next), "second");
    }

    #[tokio::test]
    async fn encode_failure_resolves_with_parse_error() {
        fn broken(_: &SubscriberSourcedMessage) -> Result<String, ParseError> {
            Err(ParseError::new("Failed to serialize outbound message: boom"))
        }
        let out = Outbound::with_encoder(8, broken);
        let reply = out.enqueue(update("x.y.z")).await.expect("queued");

        assert!(out.claim().await);
        let err = out.encode_pending().expect("pending").expect_err("fails");
        out.fail_pending(err.clone().into());

        assert!(!out.has_pending());
        assert_eq!(reply.await.expect("resolved"), Err(JetstreamError::Parse(err)));
    }

    #[tokio::test]
    async fn close_fails_pending_and_queued() {
        let out = Outbound::new(8);
        let replies = [
            out.enqueue(update("p")).await.expect("queued"),
            out.enqueue(update("q1")).await.expect("queued"),
            out.enqueue(update("q2")).await.expect("queued"),
        ];
        assert!(out.claim().await);

        assert_eq!(out.close_and_fail().await, 3);
        for reply in replies {
            let err = reply.await.expect("resolved").expect_err("failed");
            assert!(err.is_closed());
            assert_eq!(err.to_string(), "Connection Closed: Jetstream shutdown");
        }

        let late = out.enqueue(update("late")).await;
        assert!(late.expect_err("closed").is_closed());
        assert!(!out.claim().await);
    }

    #[tokio::test(start_paused = true)]
    async fn claim_waits_for_a_message() {
        let out = std::sync::Arc::new(Outbound::new(8));
        let waiting = tokio::time::timeout(Duration::from_millis(10), out.claim()).await;
        assert!(waiting.is_err());
        assert!(!out.has_pending());

        let claimer = {
            let out = std::sync::Arc::clone(&out);
            tokio::spawn(async move { out.claim().await })
        };
        let _reply = out.enqueue(update("a")).await.expect("queued");
        assert!(claimer.await.expect("join"));
        assert!(out.has_pending());
    }
}
