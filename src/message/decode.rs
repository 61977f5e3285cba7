//! # Frame decoder.
//!
//! Turns one inbound [`Frame`] into a [`JetstreamMessage`] or a classified
//! [`ParseError`]. Pure: no state, no I/O, safe to call from any task.
//!
//! ## Pipeline
//! ```text
//! Frame::Binary ──► transform? ──┐
//!                                ├──► UTF-8 ──► envelope (serde) ──► branch on kind ──► JetstreamMessage
//! Frame::Text   ─────────────────┘
//! ```
//!
//! ## Rules
//! - The envelope is permissive: `commit` / `identity` / `account` are all optional
//!   and only the one selected by `kind` is required afterwards.
//! - `record` must be *present* for create/update (`null` counts as present); its
//!   shape is not checked here.
//! - Every error carries at most [`RAW_SNIPPET_LEN`](crate::error::RAW_SNIPPET_LEN)
//!   characters of the input.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::did::Did;
use super::event::{
    Account, AccountEvent, CommitEvent, CommitInfo, DeleteEvent, DeleteInfo, EventKind, Identity,
    IdentityEvent, JetstreamMessage, Operation,
};
use super::summary::summarize_json_error;
use crate::error::ParseError;
use crate::transport::Frame;

/// Fallible byte transform applied to binary frames before UTF-8 decoding
/// (zstd decompression when `compress` is enabled).
///
/// The transform's own [`ParseError`] is passed through unchanged.
pub type FrameDecoder = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>, ParseError> + Send + Sync>;

#[derive(Deserialize)]
struct RawCommit {
    rev: String,
    operation: Operation,
    collection: String,
    rkey: String,
    #[serde(default, deserialize_with = "present")]
    record: Option<Value>,
    #[serde(default)]
    cid: Option<String>,
}

#[derive(Deserialize)]
struct RawMessage {
    did: Did,
    time_us: u64,
    kind: EventKind,
    #[serde(default)]
    commit: Option<RawCommit>,
    #[serde(default)]
    identity: Option<Identity>,
    #[serde(default)]
    account: Option<Account>,
}

/// Maps a present field (including `null`) to `Some`; absence is handled by `default`.
fn present<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(de).map(Some)
}

/// Decodes one frame, applying `transform` to binary frames when provided.
pub fn decode_frame(
    frame: &Frame,
    transform: Option<&FrameDecoder>,
) -> Result<JetstreamMessage, ParseError> {
    match frame {
        Frame::Text(text) => decode_message(text),
        Frame::Binary(bytes) => match transform {
            Some(transform) => {
                let decoded = transform(bytes)?;
                decode_bytes(&decoded)
            }
            None => decode_bytes(bytes),
        },
    }
}

fn decode_bytes(bytes: &[u8]) -> Result<JetstreamMessage, ParseError> {
    match std::str::from_utf8(bytes) {
        Ok(text) => decode_message(text),
        Err(e) => Err(ParseError::new(format!("Frame is not valid UTF-8: {e}"))
            .with_raw(&String::from_utf8_lossy(bytes))),
    }
}

/// Decodes one JSON text frame.
///
/// # Example
/// ```
/// use jetstream::{decode_message, JetstreamMessage};
///
/// let msg = decode_message(
///     r#"{"did":"did:plc:abc123","time_us":1,"kind":"commit",
///         "commit":{"rev":"1","operation":"delete","collection":"app.bsky.feed.post","rkey":"r1"}}"#,
/// ).unwrap();
/// assert!(matches!(msg, JetstreamMessage::CommitDelete(_)));
///
/// assert!(decode_message("not json").is_err());
/// ```
pub fn decode_message(text: &str) -> Result<JetstreamMessage, ParseError> {
    let raw: RawMessage = serde_json::from_str(text).map_err(|e| {
        ParseError::new(format!(
            "Schema validation failed: {}",
            summarize_json_error(&e)
        ))
        .with_raw(text)
    })?;

    let fail = |message: &str| ParseError::new(message).with_raw(text);

    match raw.kind {
        EventKind::Commit => {
            let commit = raw
                .commit
                .ok_or_else(|| fail("Missing commit payload for commit event"))?;
            match commit.operation {
                Operation::Create => {
                    let event = commit_event(raw.did, raw.time_us, commit)
                        .ok_or_else(|| fail("Missing record for commit create"))?;
                    Ok(JetstreamMessage::CommitCreate(event))
                }
                Operation::Update => {
                    let event = commit_event(raw.did, raw.time_us, commit)
                        .ok_or_else(|| fail("Missing record for commit update"))?;
                    Ok(JetstreamMessage::CommitUpdate(event))
                }
                Operation::Delete => Ok(JetstreamMessage::CommitDelete(DeleteEvent {
                    did: raw.did,
                    time_us: raw.time_us,
                    commit: DeleteInfo {
                        rev: commit.rev,
                        collection: commit.collection,
                        rkey: commit.rkey,
                    },
                })),
            }
        }
        EventKind::Identity => {
            let identity = raw
                .identity
                .ok_or_else(|| fail("Missing identity payload for identity event"))?;
            Ok(JetstreamMessage::Identity(IdentityEvent {
                did: raw.did,
                time_us: raw.time_us,
                identity,
            }))
        }
        EventKind::Account => {
            let account = raw
                .account
                .ok_or_else(|| fail("Missing account payload for account event"))?;
            Ok(JetstreamMessage::Account(AccountEvent {
                did: raw.did,
                time_us: raw.time_us,
                account,
            }))
        }
    }
}

fn commit_event(did: Did, time_us: u64, commit: RawCommit) -> Option<CommitEvent> {
    let record = commit.record?;
    Some(CommitEvent {
        did,
        time_us,
        commit: CommitInfo {
            rev: commit.rev,
            collection: commit.collection,
            rkey: commit.rkey,
            record,
            cid: commit.cid,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::AccountStatus;
    use serde_json::json;

    fn decode(v: Value) -> Result<JetstreamMessage, ParseError> {
        decode_message(&v.to_string())
    }

    #[test]
    fn decodes_commit_create() {
        let msg = decode(json!({
            "did": "did:plc:eygmaihciaxprqvxpfvl6flk",
            "time_us": 1725911162329308u64,
            "kind": "commit",
            "commit": {
                "rev": "3l3qo2vutsw2b",
                "operation": "create",
                "collection": "app.bsky.feed.like",
                "rkey": "3l3qo2vuowo2b",
                "record": {
                    "$type": "app.bsky.feed.like",
                    "createdAt": "2024-09-09T19:46:02.102Z",
                    "subject": {
                        "cid": "bafyreidc6sydkkbchcyg62v77wbhzvb2mvytlmsychqgwf2xojjtirmzj4",
                        "uri": "at://did:plc:wa7b35aakoll7hugkrjtf3xf/app.bsky.feed.post/3l3pte3p2e325"
                    }
                },
                "cid": "bafyreidwaivazkwu67xztlmuobx35hs2lnfh3kolmgfmucldvhd3sgzcqi"
            }
        }))
        .expect("valid create");

        let JetstreamMessage::CommitCreate(ev) = &msg else {
            panic!("expected CommitCreate, got {msg:?}");
        };
        assert_eq!(ev.did.as_str(), "did:plc:eygmaihciaxprqvxpfvl6flk");
        assert_eq!(ev.time_us, 1725911162329308);
        assert_eq!(ev.commit.collection, "app.bsky.feed.like");
        assert_eq!(ev.commit.record["$type"], "app.bsky.feed.like");
        assert!(ev.commit.cid.is_some());
    }

    #[test]
    fn decodes_commit_delete_exactly() {
        let msg = decode_message(
            r#"{"did":"did:plc:abc123","time_us":1,"kind":"commit","commit":{"rev":"1","operation":"delete","collection":"app.bsky.feed.post","rkey":"r1"}}"#,
        )
        .expect("valid delete");

        assert_eq!(
            msg,
            JetstreamMessage::CommitDelete(DeleteEvent {
                did: Did::parse("did:plc:abc123").expect("did"),
                time_us: 1,
                commit: DeleteInfo {
                    rev: "1".into(),
                    collection: "app.bsky.feed.post".into(),
                    rkey: "r1".into(),
                },
            })
        );
    }

    #[test]
    fn create_and_update_require_record_presence() {
        for op in ["create", "update"] {
            let err = decode(json!({
                "did": "did:plc:abc", "time_us": 1, "kind": "commit",
                "commit": { "rev": "1", "operation": op, "collection": "c", "rkey": "r" }
            }))
            .expect_err("record missing");
            assert_eq!(err.message, format!("Missing record for commit {op}"));
            assert!(err.raw.is_some());
        }

        let null_record = decode(json!({
            "did": "did:plc:abc", "time_us": 1, "kind": "commit",
            "commit": { "rev": "1", "operation": "update", "collection": "c", "rkey": "r", "record": null }
        }));
        assert!(matches!(null_record, Ok(JetstreamMessage::CommitUpdate(_))));
    }

    #[test]
    fn decodes_identity_with_and_without_handle() {
        let with = decode(json!({
            "did": "did:plc:ufbl4k27gp6kzas5glhz7fim", "time_us": 1725516665234703u64, "kind": "identity",
            "identity": { "did": "did:plc:ufbl4k27gp6kzas5glhz7fim", "handle": "yohenrique.bsky.social",
                          "seq": 1409752997, "time": "2024-09-05T06:11:04.870Z" }
        }));
        let Ok(JetstreamMessage::Identity(ev)) = &with else {
            panic!("expected identity: {with:?}");
        };
        assert_eq!(ev.identity.handle.as_deref(), Some("yohenrique.bsky.social"));

        let without = decode(json!({
            "did": "did:plc:hslv64eax7d2lwrm7qtg44ud", "time_us": 17374587134000000u64, "kind": "identity",
            "identity": { "did": "did:plc:hslv64eax7d2lwrm7qtg44ud", "seq": 17374587134i64,
                          "time": "2026-01-21T12:45:41.876Z" }
        }));
        let Ok(JetstreamMessage::Identity(ev)) = &without else {
            panic!("expected identity: {without:?}");
        };
        assert_eq!(ev.identity.handle, None);
    }

    #[test]
    fn decodes_every_account_status() {
        let statuses = [
            ("takendown", AccountStatus::Takendown),
            ("suspended", AccountStatus::Suspended),
            ("deleted", AccountStatus::Deleted),
            ("deactivated", AccountStatus::Deactivated),
            ("desynchronized", AccountStatus::Desynchronized),
            ("throttled", AccountStatus::Throttled),
        ];
        for (wire, expected) in statuses {
            let msg = decode(json!({
                "did": "did:plc:status", "time_us": 1, "kind": "account",
                "account": { "active": false, "did": "did:plc:status", "seq": 1,
                             "time": "2024-09-05T06:11:04.870Z", "status": wire }
            }));
            let Ok(JetstreamMessage::Account(ev)) = &msg else {
                panic!("expected account for {wire}: {msg:?}");
            };
            assert_eq!(ev.account.status, Some(expected));
        }
    }

    #[test]
    fn rejects_unknown_account_status() {
        let err = decode(json!({
            "did": "did:plc:badstatus", "time_us": 1, "kind": "account",
            "account": { "active": false, "did": "did:plc:badstatus", "seq": 1,
                         "time": "2024-09-05T06:11:04.870Z", "status": "shadowbanned" }
        }))
        .expect_err("unknown status");
        assert!(err.message.starts_with("Schema validation failed"));
    }

    #[test]
    fn rejects_invalid_json_unknown_kind_and_missing_payload() {
        assert!(decode_message("not json").is_err());

        let unknown = decode(json!({ "did": "did:plc:abc", "time_us": 123, "kind": "unknown" }));
        assert!(unknown.is_err());

        let missing = decode(json!({ "did": "did:plc:abc", "time_us": 123, "kind": "identity" }))
            .expect_err("missing identity");
        assert_eq!(missing.message, "Missing identity payload for identity event");

        let bad_did = decode(json!({ "did": "plc:abc", "time_us": 1, "kind": "identity" }));
        assert!(bad_did.is_err());
    }

    #[test]
    fn type_mismatched_payload_fails() {
        let err = decode(json!({
            "did": "did:plc:abc", "time_us": 1, "kind": "account",
            "account": { "active": "yes", "did": "did:plc:abc", "seq": 1, "time": "t" }
        }));
        assert!(err.is_err());
    }

    #[test]
    fn binary_frames_use_transform() {
        let text = r#"{"did":"did:plc:abc","time_us":5,"kind":"identity","identity":{"did":"did:plc:abc","seq":1,"time":"t"}}"#;
        let reversed: Vec<u8> = text.bytes().rev().collect();
        let unreverse: FrameDecoder = Arc::new(|b: &[u8]| Ok::<_, ParseError>(b.iter().rev().copied().collect()));

        let msg = decode_frame(&Frame::Binary(reversed), Some(&unreverse)).expect("decoded");
        assert_eq!(msg.time_us(), 5);

        let plain = decode_frame(&Frame::Binary(text.as_bytes().to_vec()), None).expect("plain");
        assert_eq!(plain.kind(), EventKind::Identity);
    }

    #[test]
    fn transform_failure_is_passed_through() {
        let failing: FrameDecoder =
            Arc::new(|_: &[u8]| Err::<Vec<u8>, _>(ParseError::new("Zstd decompression failed: bad magic")));
        let err = decode_frame(&Frame::Binary(vec![1, 2, 3]), Some(&failing)).expect_err("fails");
        assert!(err.message.starts_with("Zstd decompression failed"));
    }

    #[test]
    fn text_frames_bypass_transform() {
        let failing: FrameDecoder = Arc::new(|_: &[u8]| Err::<Vec<u8>, _>(ParseError::new("should not run")));
        let frame = Frame::Text(
            r#"{"did":"did:plc:abc","time_us":5,"kind":"identity","identity":{"did":"did:plc:abc","seq":1,"time":"t"}}"#
                .into(),
        );
        assert!(decode_frame(&frame, Some(&failing)).is_ok());
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let err = decode_frame(&Frame::Binary(vec![0xff, 0xfe, 0xfd]), None).expect_err("utf8");
        assert!(err.message.contains("UTF-8"));
    }

    #[test]
    fn reencoding_preserves_captured_fields() {
        let frames = [
            json!({ "did": "did:plc:a", "time_us": 10, "kind": "commit",
                    "commit": { "rev": "r", "operation": "create", "collection": "app.bsky.feed.post",
                                "rkey": "k", "record": { "text": "hi" }, "cid": "bafy" } }),
            json!({ "did": "did:plc:a", "time_us": 11, "kind": "commit",
                    "commit": { "rev": "r", "operation": "delete", "collection": "app.bsky.feed.post", "rkey": "k" } }),
            json!({ "did": "did:plc:a", "time_us": 12, "kind": "account",
                    "account": { "active": false, "did": "did:plc:a", "seq": 3, "time": "t", "status": "deleted" } }),
        ];
        for frame in frames {
            let msg = decode(frame.clone()).expect("decodes");
            let encoded = serde_json::to_value(&msg).expect("encodes");
            assert_eq!(encoded, frame);
        }
    }
}
