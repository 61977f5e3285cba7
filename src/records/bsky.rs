use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Record;
use crate::message::Did;

/// Reference to another record by URI and content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongRef {
    pub uri: String,
    pub cid: String,
}

/// Thread position of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub root: StrongRef,
    pub parent: StrongRef,
}

/// `app.bsky.feed.post`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub text: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub langs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<Value>>,
}

/// `app.bsky.feed.like`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub subject: StrongRef,
    pub created_at: String,
}

/// `app.bsky.feed.repost`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repost {
    pub subject: StrongRef,
    pub created_at: String,
}

/// `app.bsky.graph.follow`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub subject: Did,
    pub created_at: String,
}

/// `app.bsky.graph.block`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub subject: Did,
    pub created_at: String,
}

/// `app.bsky.actor.profile`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<Value>,
}

impl Record for Post {
    const COLLECTION: &'static str = "app.bsky.feed.post";
}

impl Record for Like {
    const COLLECTION: &'static str = "app.bsky.feed.like";
}

impl Record for Repost {
    const COLLECTION: &'static str = "app.bsky.feed.repost";
}

impl Record for Follow {
    const COLLECTION: &'static str = "app.bsky.graph.follow";
}

impl Record for Block {
    const COLLECTION: &'static str = "app.bsky.graph.block";
}

impl Record for Profile {
    const COLLECTION: &'static str = "app.bsky.actor.profile";
}
