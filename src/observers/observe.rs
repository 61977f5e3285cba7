//! # Observer trait
//!
//! `Observe` is the extension point for plugging metrics, logging or tests into
//! the client. Each observer is driven by a dedicated worker fed by a bounded
//! queue owned by the client's `ObserverSet`.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they never block the
//!   connection supervisor nor other observers.
//! - Each observer declares its queue capacity via [`Observe::queue_capacity`].
//!   On overflow, events for that observer are **dropped** (warn).
//!
//! ## Example
//! ```rust
//! use jetstream::{Observe, RuntimeEvent, RuntimeEventKind};
//!
//! struct DropCounter(std::sync::atomic::AtomicU64);
//!
//! #[async_trait::async_trait]
//! impl Observe for DropCounter {
//!     async fn on_event(&self, ev: &RuntimeEvent) {
//!         if let RuntimeEventKind::InboundDropped { .. } = ev.kind {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "drop-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::RuntimeEvent;

/// Contract for runtime observers.
///
/// Called from an observer-dedicated worker task.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &RuntimeEvent);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this observer's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
