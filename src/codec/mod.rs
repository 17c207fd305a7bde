//! Record codecs
//!
//! Binary layouts for the two record shapes kept in the store: cached peers
//! and secret-chat sessions. Stored values are the hex encoding of these bytes.

pub mod peer;
pub mod secret_chat;

pub use peer::{PeerRecord, PEER_FORMAT_V2};
pub use secret_chat::SecretChatRecord;

use crate::error::DecodeError;

/// Hex-encode a record's bytes for storage as a string value.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Inverse of [`to_hex`].
pub fn from_hex(value: &str) -> Result<Vec<u8>, DecodeError> {
    hex::decode(value).map_err(|_| DecodeError::InvalidHex)
}
