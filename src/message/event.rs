//! # Typed Jetstream events.
//!
//! [`JetstreamMessage`] is a closed sum over the five event shapes the server emits.
//! The discriminants on the wire (`kind`, `commit.operation`) select exactly one
//! variant, so consumers match exhaustively:
//!
//! ```text
//! kind=commit   operation=create ─► CommitCreate(CommitEvent)
//! kind=commit   operation=update ─► CommitUpdate(CommitEvent)
//! kind=commit   operation=delete ─► CommitDelete(DeleteEvent)
//! kind=identity                  ─► Identity(IdentityEvent)
//! kind=account                   ─► Account(AccountEvent)
//! ```
//!
//! Serializing a message produces the wire envelope again, so the fields captured
//! here survive a decode → encode round trip.

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::did::Did;

/// Top-level event classification (`kind` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Repository write (create/update/delete of a record).
    Commit,
    /// Handle or identity document change.
    Identity,
    /// Hosting status change.
    Account,
}

impl EventKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Commit => "commit",
            EventKind::Identity => "identity",
            EventKind::Account => "account",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commit operation (`commit.operation` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Account hosting status. The set is closed: any other value fails decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Takendown,
    Suspended,
    Deleted,
    Deactivated,
    Desynchronized,
    Throttled,
}

/// Commit payload of a create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub rev: String,
    pub collection: String,
    pub rkey: String,
    /// Opaque record body; shape checks belong to [`crate::records`].
    pub record: Value,
    pub cid: Option<String>,
}

/// Commit payload of a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteInfo {
    pub rev: String,
    pub collection: String,
    pub rkey: String,
}

/// Identity payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub did: Did,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub seq: i64,
    pub time: String,
}

/// Account payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub active: bool,
    pub did: Did,
    pub seq: i64,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
}

/// A create or update commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitEvent {
    pub did: Did,
    pub time_us: u64,
    pub commit: CommitInfo,
}

/// A delete commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEvent {
    pub did: Did,
    pub time_us: u64,
    pub commit: DeleteInfo,
}

/// An identity event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEvent {
    pub did: Did,
    pub time_us: u64,
    pub identity: Identity,
}

/// An account event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEvent {
    pub did: Did,
    pub time_us: u64,
    pub account: Account,
}

/// One decoded Jetstream event.
#[derive(Debug, Clone, PartialEq)]
pub enum JetstreamMessage {
    CommitCreate(CommitEvent),
    CommitUpdate(CommitEvent),
    CommitDelete(DeleteEvent),
    Identity(IdentityEvent),
    Account(AccountEvent),
}

impl JetstreamMessage {
    /// The `kind` discriminant.
    pub fn kind(&self) -> EventKind {
        match self {
            JetstreamMessage::CommitCreate(_)
            | JetstreamMessage::CommitUpdate(_)
            | JetstreamMessage::CommitDelete(_) => EventKind::Commit,
            JetstreamMessage::Identity(_) => EventKind::Identity,
            JetstreamMessage::Account(_) => EventKind::Account,
        }
    }

    /// The repository DID the event belongs to.
    pub fn did(&self) -> &Did {
        match self {
            JetstreamMessage::CommitCreate(e) | JetstreamMessage::CommitUpdate(e) => &e.did,
            JetstreamMessage::CommitDelete(e) => &e.did,
            JetstreamMessage::Identity(e) => &e.did,
            JetstreamMessage::Account(e) => &e.did,
        }
    }

    /// Server-side timestamp in microseconds (usable as a resume cursor).
    pub fn time_us(&self) -> u64 {
        match self {
            JetstreamMessage::CommitCreate(e) | JetstreamMessage::CommitUpdate(e) => e.time_us,
            JetstreamMessage::CommitDelete(e) => e.time_us,
            JetstreamMessage::Identity(e) => e.time_us,
            JetstreamMessage::Account(e) => e.time_us,
        }
    }

    /// Commit operation, or `None` for identity/account events.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            JetstreamMessage::CommitCreate(_) => Some(Operation::Create),
            JetstreamMessage::CommitUpdate(_) => Some(Operation::Update),
            JetstreamMessage::CommitDelete(_) => Some(Operation::Delete),
            JetstreamMessage::Identity(_) | JetstreamMessage::Account(_) => None,
        }
    }

    /// Collection NSID for commit events.
    pub fn collection(&self) -> Option<&str> {
        match self {
            JetstreamMessage::CommitCreate(e) | JetstreamMessage::CommitUpdate(e) => {
                Some(&e.commit.collection)
            }
            JetstreamMessage::CommitDelete(e) => Some(&e.commit.collection),
            JetstreamMessage::Identity(_) | JetstreamMessage::Account(_) => None,
        }
    }

    /// Variant name, for logs.
    pub fn tag(&self) -> &'static str {
        match self {
            JetstreamMessage::CommitCreate(_) => "CommitCreate",
            JetstreamMessage::CommitUpdate(_) => "CommitUpdate",
            JetstreamMessage::CommitDelete(_) => "CommitDelete",
            JetstreamMessage::Identity(_) => "IdentityEvent",
            JetstreamMessage::Account(_) => "AccountEvent",
        }
    }
}

#[derive(Serialize)]
struct WireEnvelope<'a> {
    did: &'a Did,
    time_us: u64,
    kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit: Option<WireCommit<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    identity: Option<&'a Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<&'a Account>,
}

#[derive(Serialize)]
struct WireCommit<'a> {
    rev: &'a str,
    operation: Operation,
    collection: &'a str,
    rkey: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cid: Option<&'a str>,
}

impl<'a> WireCommit<'a> {
    fn with_record(op: Operation, c: &'a CommitInfo) -> Self {
        Self {
            rev: &c.rev,
            operation: op,
            collection: &c.collection,
            rkey: &c.rkey,
            record: Some(&c.record),
            cid: c.cid.as_deref(),
        }
    }
}

impl Serialize for JetstreamMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut env = WireEnvelope {
            did: self.did(),
            time_us: self.time_us(),
            kind: self.kind(),
            commit: None,
            identity: None,
            account: None,
        };
        match self {
            JetstreamMessage::CommitCreate(e) => {
                env.commit = Some(WireCommit::with_record(Operation::Create, &e.commit));
            }
            JetstreamMessage::CommitUpdate(e) => {
                env.commit = Some(WireCommit::with_record(Operation::Update, &e.commit));
            }
            JetstreamMessage::CommitDelete(e) => {
                env.commit = Some(WireCommit {
                    rev: &e.commit.rev,
                    operation: Operation::Delete,
                    collection: &e.commit.collection,
                    rkey: &e.commit.rkey,
                    record: None,
                    cid: None,
                });
            }
            JetstreamMessage::Identity(e) => env.identity = Some(&e.identity),
            JetstreamMessage::Account(e) => env.account = Some(&e.account),
        }
        env.serialize(serializer)
    }
}
