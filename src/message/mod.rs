//! Wire messages: inbound events, outbound control messages, and the decoder.
//!
//! ## Contents
//! - [`JetstreamMessage`] and its payload types (closed sum over event shapes)
//! - [`Did`] validated identifier newtype
//! - [`decode_frame`] / [`decode_message`] pure decoder with classified failures
//! - [`SubscriberSourcedMessage`] / [`OptionsUpdate`] outbound control messages

mod decode;
mod did;
mod event;
mod outbound;
mod summary;

pub use decode::{FrameDecoder, decode_frame, decode_message};
pub use did::{Did, InvalidDid};
pub use event::{
    Account, AccountEvent, AccountStatus, CommitEvent, CommitInfo, DeleteEvent, DeleteInfo,
    EventKind, Identity, IdentityEvent, JetstreamMessage, Operation,
};
pub use outbound::{MAX_WANTED_COLLECTIONS, MAX_WANTED_DIDS, OptionsUpdate, SubscriberSourcedMessage};

pub(crate) use outbound::check_filter_limits;
pub(crate) use summary::summarize_issues;
