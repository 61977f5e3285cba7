//! # Dispatch loop.
//!
//! [`JetstreamClient::run`] pulls events off the stream one at a time and
//! offers each to every registered handler, in registration order.
//!
//! ```text
//! event ──► matcher 1 ── None ──► skip
//!       ├─► matcher 2 ── Some(fut) ──► await fut
//!       │                 panic / Err ──► warn!, continue
//!       └─► matcher N ...
//! ```
//!
//! Handlers run sequentially, so one event's handlers finish before the next
//! event is pulled. A panic is caught whether it happens while the matcher
//! builds the future or while the future runs.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tracing::{debug, warn};

use super::handler::{Handler, HandlerError, Matcher, TypedCommit, typed};
use crate::{
    core::Jetstream,
    error::JetstreamError,
    message::{DeleteEvent, EventKind, JetstreamMessage, Operation},
    records::Record,
};

/// Handler registry over a [`Jetstream`] stream.
///
/// ```no_run
/// # async fn demo(js: std::sync::Arc<jetstream::Jetstream>) -> Result<(), jetstream::JetstreamError> {
/// use jetstream::{JetstreamClient, records::Post};
///
/// let mut client = JetstreamClient::new(js);
/// client.on_create::<Post, _, _>(|commit| async move {
///     println!("{}: {}", commit.did, commit.record.text);
///     Ok(())
/// });
/// client.run().await
/// # }
/// ```
pub struct JetstreamClient {
    jetstream: Arc<Jetstream>,
    handlers: Vec<Handler>,
}

impl JetstreamClient {
    pub fn new(jetstream: Arc<Jetstream>) -> Self {
        Self {
            jetstream,
            handlers: Vec::new(),
        }
    }

    /// The underlying client, e.g. to send `options_update` or shut down.
    pub fn jetstream(&self) -> &Arc<Jetstream> {
        &self.jetstream
    }

    /// Handles every event of `kind`.
    pub fn on<F, Fut>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(JetstreamMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.push(
            "on",
            Box::new(move |event: &JetstreamMessage| {
                (event.kind() == kind).then(|| handler(event.clone()).boxed())
            }),
        )
    }

    /// Handles creates in `R::COLLECTION`, with the record decoded as `R`.
    pub fn on_create<R, F, Fut>(&mut self, handler: F) -> &mut Self
    where
        R: Record,
        F: Fn(TypedCommit<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.push("on_create", typed::<R, _, _>(Operation::Create, handler))
    }

    /// Handles updates in `R::COLLECTION`, with the record decoded as `R`.
    pub fn on_update<R, F, Fut>(&mut self, handler: F) -> &mut Self
    where
        R: Record,
        F: Fn(TypedCommit<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.push("on_update", typed::<R, _, _>(Operation::Update, handler))
    }

    /// Handles deletes in `collection`.
    pub fn on_delete<F, Fut>(&mut self, collection: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(DeleteEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let collection = collection.into();
        self.push(
            "on_delete",
            Box::new(move |event: &JetstreamMessage| match event {
                JetstreamMessage::CommitDelete(e) if e.commit.collection == collection => {
                    Some(handler(e.clone()).boxed())
                }
                _ => None,
            }),
        )
    }

    fn push(&mut self, label: &'static str, matcher: Matcher) -> &mut Self {
        self.handlers.push(Handler { label, matcher });
        self
    }

    /// Consumes the stream and dispatches each event.
    ///
    /// Returns `Ok(())` when the stream ends (after shutdown) and the stream's
    /// error if it fails.
    pub async fn run(&self) -> Result<(), JetstreamError> {
        let mut stream = self.jetstream.stream();
        while let Some(item) = stream.next().await {
            let event = item?;
            self.dispatch(&event).await;
        }
        debug!("jetstream client stream ended");
        Ok(())
    }

    /// Runs every matching handler in registration order.
    pub(crate) async fn dispatch(&self, event: &JetstreamMessage) {
        for handler in &self.handlers {
            // The matcher runs the handler's synchronous prefix, which may panic too.
            let fut = match panic::catch_unwind(AssertUnwindSafe(|| (handler.matcher)(event))) {
                Ok(Some(fut)) => fut,
                Ok(None) => continue,
                Err(payload) => {
                    log_failure(handler.label, event, &panic_message(payload.as_ref()));
                    continue;
                }
            };
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log_failure(handler.label, event, &e.to_string()),
                Err(payload) => log_failure(handler.label, event, &panic_message(payload.as_ref())),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let msg = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload");
    format!("panic: {msg}")
}

fn log_failure(label: &str, event: &JetstreamMessage, cause: &str) {
    warn!(
        handler = label,
        kind = %event.kind(),
        did = %event.did(),
        collection = event.collection().unwrap_or(""),
        cause,
        "jetstream handler failed"
    );
}
