//! Typed Bluesky record bodies.
//!
//! Commit events carry their record as an opaque [`serde_json::Value`]. The
//! types here give the common `app.bsky.*` collections a typed shape; use
//! [`decode_record`] (or the typed handlers on
//! [`JetstreamClient`](crate::JetstreamClient)) to convert.
//!
//! ## Rules
//! - `$type` must be present and equal to the record's collection NSID.
//! - Field names follow the wire (`createdAt`, `displayName`, ...).
//! - Unknown fields are ignored; blobs and embeds stay opaque.

mod bsky;

pub use bsky::{Block, Follow, Like, Post, Profile, ReplyRef, Repost, StrongRef};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ParseError;
use crate::message::summarize_issues;

/// A record type bound to one collection NSID.
pub trait Record: DeserializeOwned + Send + Sync + 'static {
    /// Collection NSID, also the expected `$type`.
    const COLLECTION: &'static str;
}

/// Validates `$type` and decodes `value` as `R`.
///
/// # Example
/// ```
/// use jetstream::records::{decode_record, Like};
///
/// let like: Like = decode_record(&serde_json::json!({
///     "$type": "app.bsky.feed.like",
///     "createdAt": "2024-09-09T19:46:02.102Z",
///     "subject": { "uri": "at://did:plc:a/app.bsky.feed.post/1", "cid": "bafy" }
/// }))
/// .unwrap();
/// assert_eq!(like.subject.cid, "bafy");
/// ```
pub fn decode_record<R: Record>(value: &Value) -> Result<R, ParseError> {
    let mut issues = Vec::new();
    match value.get("$type") {
        Some(Value::String(t)) if t == R::COLLECTION => {}
        Some(Value::String(t)) => issues.push(format!("$type: expected {}, got {t}", R::COLLECTION)),
        Some(_) => issues.push("$type: expected a string".to_string()),
        None => issues.push("$type: missing".to_string()),
    }

    let decoded = R::deserialize(value);
    if let Err(e) = &decoded {
        issues.push(e.to_string());
    }

    match decoded {
        Ok(record) if issues.is_empty() => Ok(record),
        _ => Err(ParseError::new(format!(
            "Record schema validation failed for {}: {}",
            R::COLLECTION,
            summarize_issues(&issues)
        ))
        .with_raw(&value.to_string())),
    }
}
