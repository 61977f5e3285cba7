//! # Inbound mailbox.
//!
//! Bounded buffer between the read loop and the public event stream.
//!
//! ```text
//! read loop ── offer(msg) ──► [ VecDeque (cap N) ] ──► recv() ──► stream()
//!                  │
//!                  └─ full? ─► Suspend  : wait for space
//!                             Dropping : reject the new message
//!                             Sliding  : evict the oldest, keep the new one
//! ```
//!
//! ## Rules
//! - Wire order is preserved; overflow may drop or evict but never reorders.
//! - `end()` and `fail(err)` are terminal and first-wins. Buffered messages are
//!   still delivered; afterwards the stream ends (or yields `err` once, then ends).
//! - `offer` after termination returns [`Offer::Closed`]; a suspended `offer`
//!   wakes up with `Closed` as well.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::Notify;

use crate::error::JetstreamError;
use crate::message::JetstreamMessage;

/// The public stream of decoded messages.
pub type EventStream = BoxStream<'static, Result<JetstreamMessage, JetstreamError>>;

/// What to do when a message arrives and the buffer is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferStrategy {
    /// Backpressure: the read loop waits until the consumer makes room.
    #[default]
    Suspend,
    /// Discard the incoming message, keep what is buffered.
    Dropping,
    /// Evict the oldest buffered message to make room for the incoming one.
    Sliding,
}

/// Outcome of [`Mailbox::offer`].
#[derive(Debug)]
pub(crate) enum Offer {
    Accepted,
    /// Buffer full under `Dropping`; the offered message is handed back.
    Rejected(JetstreamMessage),
    /// Buffer full under `Sliding`; the evicted oldest message is handed back.
    Evicted(JetstreamMessage),
    /// The mailbox has ended or failed.
    Closed,
}

#[derive(Debug)]
enum Terminal {
    Ended,
    Failed(JetstreamError),
}

struct State {
    queue: VecDeque<JetstreamMessage>,
    terminal: Option<Terminal>,
}

/// Bounded, multi-consumer inbound buffer.
pub(crate) struct Mailbox {
    capacity: usize,
    strategy: BufferStrategy,
    state: Mutex<State>,
    not_empty: Notify,
    not_full: Notify,
}

impl Mailbox {
    pub(crate) fn new(capacity: usize, strategy: BufferStrategy) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            strategy,
            state: Mutex::new(State {
                queue: VecDeque::with_capacity(capacity.min(4096)),
                terminal: None,
            }),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    /// Offers one message according to the overflow strategy.
    ///
    /// Only `Suspend` ever waits; cancelling a suspended offer loses that message.
    pub(crate) async fn offer(&self, msg: JetstreamMessage) -> Offer {
        let mut msg = Some(msg);
        loop {
            let space = self.not_full.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            {
                let mut st = self.state.lock();
                if st.terminal.is_some() {
                    return Offer::Closed;
                }
                let Some(m) = msg.take() else {
                    return Offer::Closed;
                };
                if st.queue.len() < self.capacity {
                    st.queue.push_back(m);
                    drop(st);
                    self.not_empty.notify_waiters();
                    return Offer::Accepted;
                }
                match self.strategy {
                    BufferStrategy::Dropping => return Offer::Rejected(m),
                    BufferStrategy::Sliding => {
                        let evicted = st.queue.pop_front();
                        st.queue.push_back(m);
                        drop(st);
                        self.not_empty.notify_waiters();
                        return match evicted {
                            Some(old) => Offer::Evicted(old),
                            None => Offer::Accepted,
                        };
                    }
                    BufferStrategy::Suspend => msg = Some(m),
                }
            }

            space.await;
        }
    }

    /// Next message, `None` once ended and drained, `Some(Err)` once failed and drained.
    pub(crate) async fn recv(&self) -> Option<Result<JetstreamMessage, JetstreamError>> {
        loop {
            let ready = self.not_empty.notified();
            tokio::pin!(ready);
            ready.as_mut().enable();

            {
                let mut st = self.state.lock();
                if let Some(m) = st.queue.pop_front() {
                    drop(st);
                    self.not_full.notify_waiters();
                    return Some(Ok(m));
                }
                match &st.terminal {
                    Some(Terminal::Ended) => return None,
                    Some(Terminal::Failed(err)) => return Some(Err(err.clone())),
                    None => {}
                }
            }

            ready.await;
        }
    }

    /// Ends the mailbox cleanly. No-op if already terminated.
    pub(crate) fn end(&self) {
        self.terminate(Terminal::Ended);
    }

    /// Fails the mailbox. No-op if already terminated.
    pub(crate) fn fail(&self, err: JetstreamError) {
        self.terminate(Terminal::Failed(err));
    }

    fn terminate(&self, terminal: Terminal) {
        {
            let mut st = self.state.lock();
            if st.terminal.is_some() {
                return;
            }
            st.terminal = Some(terminal);
        }
        self.not_empty.notify_waiters();
        self.not_full.notify_waiters();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// A lazy stream over [`Mailbox::recv`]; terminates after the first error.
    pub(crate) fn stream(self: &Arc<Self>) -> EventStream {
        stream::unfold(Some(Arc::clone(self)), |mailbox| async move {
            let mailbox = mailbox?;
            match mailbox.recv().await {
                Some(Ok(m)) => Some((Ok(m), Some(mailbox))),
                Some(Err(e)) => Some((Err(e), None)),
                None => None,
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ConnectionError;
    use crate::message::decode_message;

    fn identity(seq: i64) -> JetstreamMessage {
        decode_message(&format!(
            r#"{{"did":"did:plc:m{seq}","time_us":{seq},"kind":"identity",
                "identity":{{"did":"did:plc:m{seq}","seq":{seq},"time":"2024-09-09T19:46:02.102Z"}}}}"#
        ))
        .expect("valid identity frame")
    }

    async fn drain(mailbox: &Arc<Mailbox>) -> Vec<u64> {
        mailbox.end();
        mailbox
            .stream()
            .map(|r| r.expect("no failure").time_us())
            .collect()
            .await
    }

    #[tokio::test]
    async fn dropping_rejects_new_and_keeps_old() {
        let mailbox = Arc::new(Mailbox::new(2, BufferStrategy::Dropping));
        assert!(matches!(mailbox.offer(identity(1)).await, Offer::Accepted));
        assert!(matches!(mailbox.offer(identity(2)).await, Offer::Accepted));
        match mailbox.offer(identity(3)).await {
            Offer::Rejected(m) => assert_eq!(m.time_us(), 3),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(drain(&mailbox).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn sliding_evicts_oldest() {
        let mailbox = Arc::new(Mailbox::new(2, BufferStrategy::Sliding));
        for seq in 1..=2 {
            assert!(matches!(mailbox.offer(identity(seq)).await, Offer::Accepted));
        }
        match mailbox.offer(identity(3)).await {
            Offer::Evicted(m) => assert_eq!(m.time_us(), 1),
            other => panic!("expected eviction, got {other:?}"),
        }
        assert_eq!(drain(&mailbox).await, vec![2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn suspend_waits_for_space() {
        let mailbox = Arc::new(Mailbox::new(1, BufferStrategy::Suspend));
        assert!(matches!(mailbox.offer(identity(1)).await, Offer::Accepted));

        let blocked = tokio::time::timeout(Duration::from_millis(50), mailbox.offer(identity(2)));
        assert!(blocked.await.is_err(), "offer must wait while full");

        let producer = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move { mailbox.offer(identity(2)).await })
        };
        tokio::task::yield_now().await;
        let first = mailbox.recv().await.expect("item").expect("ok");
        assert_eq!(first.time_us(), 1);
        assert!(matches!(producer.await.expect("join"), Offer::Accepted));
        assert_eq!(mailbox.len(), 1);
    }

    #[tokio::test]
    async fn suspended_offer_wakes_on_end() {
        let mailbox = Arc::new(Mailbox::new(1, BufferStrategy::Suspend));
        let _ = mailbox.offer(identity(1)).await;
        let producer = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move { mailbox.offer(identity(2)).await })
        };
        tokio::task::yield_now().await;
        mailbox.end();
        assert!(matches!(producer.await.expect("join"), Offer::Closed));
    }

    #[tokio::test]
    async fn end_is_terminal_and_first_wins() {
        let mailbox = Arc::new(Mailbox::new(4, BufferStrategy::Suspend));
        let _ = mailbox.offer(identity(7)).await;
        mailbox.end();
        mailbox.fail(ConnectionError::shutdown().into());
        assert!(matches!(mailbox.offer(identity(8)).await, Offer::Closed));

        let items: Vec<_> = mailbox.stream().collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_ok());
    }

    #[tokio::test]
    async fn failure_is_delivered_after_buffered_items() {
        let mailbox = Arc::new(Mailbox::new(4, BufferStrategy::Suspend));
        let _ = mailbox.offer(identity(1)).await;
        mailbox.fail(ConnectionError::connect("unreachable").into());

        let items: Vec<_> = mailbox.stream().collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert_eq!(
            items[1].as_ref().map_err(|e| e.as_label()),
            Err("connection_connect")
        );
    }

    #[tokio::test]
    async fn waiting_consumer_sees_end() {
        let mailbox = Arc::new(Mailbox::new(4, BufferStrategy::Suspend));
        let consumer = {
            let mailbox = Arc::clone(&mailbox);
            tokio::spawn(async move { mailbox.stream().count().await })
        };
        tokio::task::yield_now().await;
        let _ = mailbox.offer(identity(1)).await;
        mailbox.end();
        assert_eq!(consumer.await.expect("join"), 1);
    }
}
