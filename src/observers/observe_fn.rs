//! # Closure-backed observer (`ObserveFn`)
//!
//! Wraps a synchronous `Fn(&RuntimeEvent)` for cases where a full trait impl is
//! overkill (tests, counters, forwarding into a channel).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use jetstream::{Observe, ObserveFn};
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//! let obs = ObserveFn::arc("counter", move |_ev| {
//!     counter.fetch_add(1, Ordering::Relaxed);
//! });
//! assert_eq!(obs.name(), "counter");
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use super::Observe;
use crate::events::RuntimeEvent;

/// Function-backed observer.
pub struct ObserveFn<F> {
    name: &'static str,
    capacity: usize,
    f: F,
}

impl<F> ObserveFn<F>
where
    F: Fn(&RuntimeEvent) + Send + Sync + 'static,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self {
            name,
            capacity: 1024,
            f,
        }
    }

    /// Creates the observer and returns it as a shared handle.
    pub fn arc(name: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Overrides the queue capacity (min 1).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

#[async_trait]
impl<F> Observe for ObserveFn<F>
where
    F: Fn(&RuntimeEvent) + Send + Sync + 'static,
{
    async fn on_event(&self, event: &RuntimeEvent) {
        (self.f)(event)
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}
