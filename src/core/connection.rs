//! # Run a single connection.
//!
//! Executes one connection attempt end to end: connect (bounded by the connect
//! timeout), then race the read loop against the write loop until one of them
//! fails or the runtime token is cancelled.
//!
//! ## Event flow
//!
//! ```text
//! ConnectionAttempt ─► connect ─┬─ Err / timeout ─────────────────► Ended { opened: false }
//!                               └─ Ok ─► ConnectionOpened
//!                                          select! {
//!                                            read loop  ─► DecodeFailed / InboundDropped ...
//!                                            write loop ─► OutboundEncoded / OutboundSent ...
//!                                            cancelled  ─► Cancelled
//!                                          } ─► first loop to fail ─► Ended { opened: true }
//! ```
//!
//! ## Rules
//! - Decode failures and inbound drops never end the connection.
//! - An encode failure resolves that message's handle and keeps the connection.
//! - A failed write leaves the message in the pending slot and ends the connection.
//! - A stream that ends (clean remote close) is a `Closed` error.
//! - `ConnectionClosed` is emitted by the supervisor, not here.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt, future};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    core::{
        mailbox::{Mailbox, Offer},
        outbound::Outbound,
    },
    error::{ConnectionError, ConnectionReason},
    events::{RuntimeEvent, RuntimeEventKind},
    message::{FrameDecoder, decode_frame},
    observers::ObserverSet,
    transport::{Connect, FrameSink, FrameStream},
};

/// State shared by the public handle and the supervisor task.
pub(crate) struct Shared {
    pub(crate) mailbox: Arc<Mailbox>,
    pub(crate) outbound: Outbound,
    pub(crate) observers: ObserverSet,
    pub(crate) decoder: Option<FrameDecoder>,
}

impl Shared {
    #[inline]
    pub(crate) fn emit(&self, event: RuntimeEvent) {
        self.observers.emit(event);
    }
}

/// How one connection attempt ended.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    /// The runtime token was cancelled (shutdown).
    Cancelled,
    /// The attempt failed; `opened` tells whether it reached open first.
    Ended {
        opened: bool,
        error: ConnectionError,
    },
}

/// Executes one connection attempt.
///
/// ### Timeout behavior
/// If `timeout` is `Some(dur)`, connecting longer than `dur` yields a
/// `Timeout` error; the pending connect future is dropped.
pub(crate) async fn run_once(
    shared: &Shared,
    connector: &dyn Connect,
    url: &Url,
    url_label: &Arc<str>,
    timeout: Option<Duration>,
    attempt: u32,
    token: &CancellationToken,
) -> AttemptOutcome {
    shared.emit(RuntimeEvent::attempt(url_label, attempt));
    debug!(url = %url_label, attempt, "connecting");

    let connect = async {
        match timeout {
            Some(dur) => match time::timeout(dur, connector.connect(url)).await {
                Ok(res) => res,
                Err(_elapsed) => Err(ConnectionError::with_cause(
                    ConnectionReason::Timeout,
                    format!("no connection within {dur:?}"),
                )),
            },
            None => connector.connect(url).await,
        }
    };

    let connection = select! {
        biased;
        _ = token.cancelled() => return AttemptOutcome::Cancelled,
        res = connect => match res {
            Ok(conn) => conn,
            Err(error) => return AttemptOutcome::Ended { opened: false, error },
        },
    };

    shared.emit(RuntimeEvent::opened(url_label));
    info!(url = %url_label, "connection opened");

    let error = select! {
        biased;
        _ = token.cancelled() => return AttemptOutcome::Cancelled,
        err = read_loop(shared, connection.stream) => err,
        err = write_loop(shared, connection.sink) => err,
    };
    AttemptOutcome::Ended {
        opened: true,
        error,
    }
}

/// Socket → decoder → mailbox. Returns the error that ended the connection.
async fn read_loop(shared: &Shared, mut stream: FrameStream) -> ConnectionError {
    while let Some(item) = stream.next().await {
        let frame = match item {
            Ok(frame) => frame,
            Err(err) => return err,
        };
        match decode_frame(&frame, shared.decoder.as_ref()) {
            Ok(msg) => match shared.mailbox.offer(msg).await {
                Offer::Accepted => {}
                Offer::Rejected(dropped) | Offer::Evicted(dropped) => {
                    shared.emit(RuntimeEvent::inbound_dropped(&dropped));
                    debug!(
                        kind = %dropped.kind(),
                        did = %dropped.did(),
                        "inbound buffer full, message dropped"
                    );
                }
                Offer::Closed => return ConnectionError::closed("inbound buffer closed"),
            },
            Err(err) => {
                shared.emit(RuntimeEvent::decode_failed(&err.message));
                warn!(message = %err.message, raw = ?err.raw, "dropping malformed message");
            }
        }
    }
    ConnectionError::closed("socket closed")
}

/// Outbound channel → socket. Returns the error that ended the connection.
async fn write_loop(shared: &Shared, mut sink: FrameSink) -> ConnectionError {
    let outbound: &Outbound = &shared.outbound;
    loop {
        if !outbound.claim().await {
            // Channel closed: only shutdown does that, and shutdown cancels us.
            return future::pending().await;
        }
        let encoded = match outbound.encode_pending() {
            Some(res) => res,
            None => continue,
        };
        match encoded {
            Err(err) => {
                shared.emit(RuntimeEvent::encode_failed(&err.message));
                warn!(message = %err.message, "outbound message failed to encode");
                outbound.fail_pending(err.into());
            }
            Ok(text) => {
                shared.emit(RuntimeEvent::new(RuntimeEventKind::OutboundEncoded));
                if let Err(err) = sink.send(text).await {
                    return err;
                }
                shared.emit(RuntimeEvent::new(RuntimeEventKind::OutboundSent));
                debug!("outbound message sent");
                outbound.complete();
            }
        }
    }
}
