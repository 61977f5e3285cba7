//! # Subscriber-sourced control messages.
//!
//! The only message the server accepts today is `options_update`, which replaces
//! the subscription filters of a live connection:
//!
//! ```text
//! {"type":"options_update","payload":{"wantedCollections":[..],"wantedDids":[..],"maxMessageSizeBytes":n}}
//! ```
//!
//! Unset fields are omitted from the payload, never sent as `null`.

use serde::{Deserialize, Serialize};

use super::summary::summarize_json_error;
use crate::error::{ParseError, SubscriptionError, SubscriptionReason};

/// Server-side limit on `wantedCollections`.
pub const MAX_WANTED_COLLECTIONS: usize = 100;
/// Server-side limit on `wantedDids`.
pub const MAX_WANTED_DIDS: usize = 10_000;

/// Partial update of the subscription filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wanted_collections: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wanted_dids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_message_size_bytes: Option<u64>,
}

impl OptionsUpdate {
    /// Replaces the collection filter.
    pub fn with_collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wanted_collections = Some(collections.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the DID filter.
    pub fn with_dids<I, S>(mut self, dids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wanted_dids = Some(dids.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the maximum message size the server should send.
    pub fn with_max_message_size(mut self, bytes: u64) -> Self {
        self.max_message_size_bytes = Some(bytes);
        self
    }

    /// Checks the filters against the server limits.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        check_filter_limits(
            self.wanted_collections.as_deref().unwrap_or_default(),
            self.wanted_dids.as_deref().unwrap_or_default(),
        )
    }
}

pub(crate) fn check_filter_limits(
    collections: &[String],
    dids: &[String],
) -> Result<(), SubscriptionError> {
    if collections.len() > MAX_WANTED_COLLECTIONS {
        return Err(SubscriptionError::new(SubscriptionReason::TooManyCollections));
    }
    if dids.len() > MAX_WANTED_DIDS {
        return Err(SubscriptionError::new(SubscriptionReason::TooManyDids));
    }
    Ok(())
}

/// Control message sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SubscriberSourcedMessage {
    /// Replace the subscription filters.
    OptionsUpdate(OptionsUpdate),
}

impl SubscriberSourcedMessage {
    /// Encodes the message as a wire frame.
    pub fn encode(&self) -> Result<String, ParseError> {
        serde_json::to_string(self).map_err(|e| {
            ParseError::new(format!(
                "Failed to serialize outbound message: {}",
                summarize_json_error(&e)
            ))
        })
    }
}

impl From<OptionsUpdate> for SubscriberSourcedMessage {
    fn from(update: OptionsUpdate) -> Self {
        SubscriberSourcedMessage::OptionsUpdate(update)
    }
}
