//! # ObserverSet: non-blocking fan-out over multiple observers
//!
//! [`ObserverSet`] distributes each [`RuntimeEvent`] to every observer
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(event)` returns immediately.
//! - Per-observer FIFO (queue order).
//! - Panics inside observers are caught and logged (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different observers (use `seq`).
//! - No retries on per-observer queue overflow (events are dropped for that observer).
//!   Drops are counted; the warning fires on the 1st, 2nd, 4th, 8th, ... drop so a
//!   stalled observer cannot flood the log.
//!
//! ## Diagram
//! ```text
//!    emit(event)
//!        │                        (Arc-clone per observer)
//!        ├────────────────► [queue O1] ─► worker O1 ─► on_event()
//!        ├────────────────► [queue O2] ─► worker O2 ─► on_event()
//!        └────────────────► [queue ON] ─► worker ON ─► on_event()
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, warn};

use super::Observe;
use crate::events::RuntimeEvent;

struct ObserverChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<RuntimeEvent>>,
    dropped: AtomicU64,
}

impl ObserverChannel {
    /// Counts one dropped event. Returns the running total and whether to log it.
    fn record_drop(&self) -> (u64, bool) {
        let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        (total, total.is_power_of_two())
    }
}

/// Fan-out with per-observer bounded queues and worker tasks.
pub(crate) struct ObserverSet {
    channels: Vec<ObserverChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl ObserverSet {
    /// Creates the set and spawns one worker per observer.
    ///
    /// Must be called inside a Tokio runtime when `observers` is non-empty.
    #[must_use]
    pub(crate) fn new(observers: Vec<Arc<dyn Observe>>) -> Self {
        let mut channels = Vec::with_capacity(observers.len());
        let mut workers = Vec::with_capacity(observers.len());

        for obs in observers {
            let cap = obs.queue_capacity().max(1);
            let name = obs.name();
            let (tx, mut rx) = mpsc::channel::<Arc<RuntimeEvent>>(cap);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = obs.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        error!(observer = obs.name(), panic = ?panic, "observer panicked");
                    }
                }
            });

            channels.push(ObserverChannel {
                name,
                sender: tx,
                dropped: AtomicU64::new(0),
            });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fans one event out to all observers (non-blocking).
    ///
    /// A full or closed queue drops the event for that observer; the drop is
    /// counted and logged at power-of-two totals.
    pub(crate) fn emit(&self, event: RuntimeEvent) {
        if self.channels.is_empty() {
            return;
        }
        let ev = Arc::new(event);
        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "queue full",
                Err(mpsc::error::TrySendError::Closed(_)) => "worker closed",
            };
            let (total, log) = channel.record_drop();
            if log {
                warn!(
                    observer = channel.name,
                    event = ev.kind.label(),
                    reason,
                    dropped_total = total,
                    "observer dropped events"
                );
            }
        }
    }

    /// Closes all queues and waits for the workers to drain them.
    #[cfg(test)]
    pub(crate) async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    #[cfg(test)]
    fn dropped(&self, name: &str) -> u64 {
        self.channels
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.dropped.load(Ordering::Relaxed))
            .sum()
    }
}
