//! Handler registrations.
//!
//! A registration is a [`Matcher`]: it inspects an event and either returns the
//! handler's future or declines. Typed matchers also decode the commit record;
//! a record that fails validation declines with a warning.

use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::warn;

use crate::message::{CommitEvent, Did, JetstreamMessage, Operation};
use crate::records::{Record, decode_record};

/// Error type handlers may return; it is logged and never stops dispatch.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) type HandlerFuture = BoxFuture<'static, Result<(), HandlerError>>;

/// Returns the handler's future when the event is for it, `None` otherwise.
pub(crate) type Matcher = Box<dyn Fn(&JetstreamMessage) -> Option<HandlerFuture> + Send + Sync>;

pub(crate) struct Handler {
    pub(crate) label: &'static str,
    pub(crate) matcher: Matcher,
}

/// A create or update commit whose record decoded as `R`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedCommit<R> {
    pub did: Did,
    pub time_us: u64,
    pub rev: String,
    pub rkey: String,
    pub cid: Option<String>,
    pub record: R,
}

impl<R: Record> TypedCommit<R> {
    /// Collection NSID of the record.
    pub fn collection(&self) -> &'static str {
        R::COLLECTION
    }
}

/// Builds a matcher for commits of `R::COLLECTION` with operation `op`.
pub(crate) fn typed<R, F, Fut>(op: Operation, handler: F) -> Matcher
where
    R: Record,
    F: Fn(TypedCommit<R>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Box::new(move |event: &JetstreamMessage| {
        let commit = match (op, event) {
            (Operation::Create, JetstreamMessage::CommitCreate(e))
            | (Operation::Update, JetstreamMessage::CommitUpdate(e)) => e,
            _ => return None,
        };
        if commit.commit.collection != R::COLLECTION {
            return None;
        }
        match decode_record::<R>(&commit.commit.record) {
            Ok(record) => Some(handler(typed_commit(commit, record)).boxed()),
            Err(e) => {
                warn!(
                    collection = R::COLLECTION,
                    did = %commit.did,
                    rkey = %commit.commit.rkey,
                    error = %e,
                    "dropping malformed record"
                );
                None
            }
        }
    })
}

fn typed_commit<R>(event: &CommitEvent, record: R) -> TypedCommit<R> {
    TypedCommit {
        did: event.did.clone(),
        time_us: event.time_us,
        rev: event.commit.rev.clone(),
        rkey: event.commit.rkey.clone(),
        cid: event.commit.cid.clone(),
        record,
    }
}
