//! # Connection supervisor: reconnect loop.
//!
//! Owns exactly one physical connection at a time and keeps replacing it until
//! the runtime token is cancelled.
//!
//! ## State machine
//! ```text
//! Idle ─► Connecting ─► Open ─► Failed ─► (backoff) ─► Connecting ─► ...
//!   │          │          │        │           │
//!   └──────────┴──────────┴────────┴───────────┴──► ShutDown (token cancelled)
//! ```
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► run_once()  ─► Cancelled            → exit
//!   │               └► Ended { opened, err }
//!   ├─► opened?     → attempt = 0
//!   ├─► publish ConnectionClosed { reason, cause }
//!   └─► sleep(backoff.next(attempt)); attempt += 1   (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially**; read/write loops of two connections never overlap.
//! - Every failure is retried; there is no attempt limit.
//! - The attempt counter resets once a connection reaches open.
//! - Shutdown wins every race: cancellation is checked at every suspension point.

use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::{
    core::connection::{AttemptOutcome, Shared, run_once},
    events::RuntimeEvent,
    policies::BackoffPolicy,
    transport::Connect,
};

/// Parameters of the reconnect loop, extracted from [`Config`](crate::Config) at build time.
#[derive(Clone, Debug)]
pub(crate) struct SupervisorParams {
    pub(crate) url: Url,
    pub(crate) connect_timeout: Option<std::time::Duration>,
    pub(crate) backoff: BackoffPolicy,
}

/// Keeps one connection alive at a time, with backoff between attempts.
pub(crate) struct ConnectionSupervisor {
    shared: Arc<Shared>,
    connector: Arc<dyn Connect>,
    params: SupervisorParams,
}

impl ConnectionSupervisor {
    pub(crate) fn new(
        shared: Arc<Shared>,
        connector: Arc<dyn Connect>,
        params: SupervisorParams,
    ) -> Self {
        Self {
            shared,
            connector,
            params,
        }
    }

    /// Runs until `runtime_token` is cancelled.
    ///
    /// ### Cancellation semantics
    /// - checked before each attempt
    /// - aborts a pending connect, both connection loops, and the backoff sleep
    ///
    /// ### Backoff semantics
    /// - attempt `n` since the last open waits `backoff.next(n)`
    /// - a connection that reached open resets `n` to 0
    pub(crate) async fn run(self, runtime_token: CancellationToken) {
        let url_label: Arc<str> = self.params.url.as_str().into();
        let mut attempt: u32 = 0;

        loop {
            if runtime_token.is_cancelled() {
                break;
            }
            let child = runtime_token.child_token();
            let outcome = run_once(
                &self.shared,
                self.connector.as_ref(),
                &self.params.url,
                &url_label,
                self.params.connect_timeout,
                attempt,
                &child,
            )
            .await;

            let (opened, error) = match outcome {
                AttemptOutcome::Cancelled => break,
                AttemptOutcome::Ended { opened, error } => (opened, error),
            };
            if runtime_token.is_cancelled() {
                break;
            }
            if opened {
                attempt = 0;
            }

            self.shared.emit(RuntimeEvent::closed(&error));
            warn!(
                reason = %error.reason,
                cause = error.cause.as_deref().unwrap_or(""),
                "connection closed"
            );

            let delay = self.params.backoff.next(attempt);
            attempt = attempt.saturating_add(1);
            debug!(delay_ms = delay.as_millis() as u64, attempt, "reconnect scheduled");

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = runtime_token.cancelled() => break,
            }
        }
        debug!("connection supervisor stopped");
    }
}
