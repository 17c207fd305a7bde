//! Peer record codec
//!
//! Two layouts exist. The current one starts with the [`PEER_FORMAT_V2`]
//! marker byte and carries any number of usernames; the legacy one has no
//! marker and at most one username. Both are read, only the current one is
//! written by the store.

use crate::error::DecodeError;
use crate::tl::{TlReader, TlWriter};

/// Leading byte of the multi-username layout.
pub const PEER_FORMAT_V2: u8 = 2;

const FLAG_USERNAMES: u32 = 1 << 4;
const FLAG_PHONE: u32 = 1 << 5;

/// A resolved peer cached for later addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub id: i64,
    pub access_hash: i64,
    /// "user", "chat", "channel", ... kept opaque
    pub kind: String,
    pub usernames: Option<Vec<String>>,
    pub phone_number: Option<String>,
}

impl PeerRecord {
    pub fn new(id: i64, access_hash: i64, kind: impl Into<String>) -> Self {
        Self {
            id,
            access_hash,
            kind: kind.into(),
            usernames: None,
            phone_number: None,
        }
    }

    pub fn with_usernames<I, S>(mut self, usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.usernames = Some(usernames.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    /// Case-insensitive match against any stored username.
    pub fn matches_username(&self, username: &str) -> bool {
        let wanted = username.to_lowercase();
        self.usernames
            .iter()
            .flatten()
            .any(|u| u.to_lowercase() == wanted)
    }

    /// Exact match, no normalization.
    pub fn matches_phone_number(&self, phone_number: &str) -> bool {
        self.phone_number.as_deref() == Some(phone_number)
    }

    fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.usernames.is_some() {
            flags |= FLAG_USERNAMES;
        }
        if self.phone_number.is_some() {
            flags |= FLAG_PHONE;
        }
        flags
    }

    /// Current layout: marker, flags, id, access hash, kind, usernames?, phone?
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = TlWriter::with_capacity(64);
        writer.write_u8(PEER_FORMAT_V2);
        writer.write_u32(self.flags());
        writer.write_i64(self.id);
        writer.write_i64(self.access_hash);
        writer.write_string(&self.kind);
        if let Some(usernames) = &self.usernames {
            writer.write_string_vector(usernames.as_slice());
        }
        if let Some(phone) = &self.phone_number {
            writer.write_string(phone);
        }
        writer.into_bytes()
    }

    /// Legacy layout. Only the first username survives.
    pub fn encode_legacy(&self) -> Vec<u8> {
        let username = self.usernames.as_ref().and_then(|u| u.first());

        let mut flags = 0;
        if username.is_some() {
            flags |= FLAG_USERNAMES;
        }
        if self.phone_number.is_some() {
            flags |= FLAG_PHONE;
        }

        let mut writer = TlWriter::with_capacity(64);
        writer.write_u32(flags);
        writer.write_i64(self.id);
        writer.write_i64(self.access_hash);
        writer.write_string(&self.kind);
        if let Some(username) = username {
            writer.write_string(username);
        }
        if let Some(phone) = &self.phone_number {
            writer.write_string(phone);
        }
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = TlReader::new(bytes);

        if reader.peek_u8() == Some(PEER_FORMAT_V2) {
            reader.read_u8()?;
            Self::decode_v2(&mut reader)
        } else {
            Self::decode_legacy(&mut reader)
        }
    }

    fn decode_v2(reader: &mut TlReader<'_>) -> Result<Self, DecodeError> {
        let flags = reader.read_u32()?;
        let id = reader.read_i64()?;
        let access_hash = reader.read_i64()?;
        let kind = reader.read_string()?;

        let usernames = if flags & FLAG_USERNAMES != 0 {
            Some(reader.read_string_vector()?)
        } else {
            None
        };
        let phone_number = if flags & FLAG_PHONE != 0 {
            Some(reader.read_string()?)
        } else {
            None
        };

        Ok(Self {
            id,
            access_hash,
            kind,
            usernames,
            phone_number,
        })
    }

    fn decode_legacy(reader: &mut TlReader<'_>) -> Result<Self, DecodeError> {
        let flags = reader.read_u32()?;
        let id = reader.read_i64()?;
        let access_hash = reader.read_i64()?;
        let kind = reader.read_string()?;

        let usernames = if flags & FLAG_USERNAMES != 0 {
            Some(vec![reader.read_string()?])
        } else {
            None
        };
        let phone_number = if flags & FLAG_PHONE != 0 {
            Some(reader.read_string()?)
        } else {
            None
        };

        Ok(Self {
            id,
            access_hash,
            kind,
            usernames,
            phone_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(record: &PeerRecord) -> PeerRecord {
        PeerRecord::decode(&record.encode()).unwrap()
    }

    #[test]
    fn test_roundtrip_username_counts() {
        let bare = PeerRecord::new(1, 2, "user");
        assert_eq!(roundtrip(&bare), bare);

        let empty = PeerRecord::new(1, 2, "user").with_usernames(Vec::<String>::new());
        assert_eq!(roundtrip(&empty), empty);

        let one = PeerRecord::new(-100, i64::MIN, "channel").with_usernames(["durov"]);
        assert_eq!(roundtrip(&one), one);

        let many = PeerRecord::new(123, 456, "user")
            .with_usernames(["alice", "Bob", "CAROL_99"])
            .with_phone_number("+15550001111");
        assert_eq!(roundtrip(&many), many);
    }

    #[test]
    fn test_roundtrip_phone_only() {
        let record = PeerRecord::new(7, 8, "user").with_phone_number("79990000000");
        assert_eq!(roundtrip(&record), record);
    }

    #[test]
    fn test_unknown_kind_is_opaque() {
        let record = PeerRecord::new(5, 6, "bot-of-the-future");
        assert_eq!(roundtrip(&record).kind, "bot-of-the-future");
    }

    #[test]
    fn test_v2_layout_bytes() {
        let bytes = PeerRecord::new(1, 2, "user").with_phone_number("1").encode();

        assert_eq!(bytes[0], PEER_FORMAT_V2);
        assert_eq!(&bytes[1..5], &FLAG_PHONE.to_le_bytes());
        assert_eq!(&bytes[5..13], &1i64.to_le_bytes());
        assert_eq!(&bytes[13..21], &2i64.to_le_bytes());
        assert_eq!(&bytes[21..29], &[4, b'u', b's', b'e', b'r', 0, 0, 0]);
        assert_eq!(&bytes[29..], &[1, b'1', 0, 0]);
    }

    #[test]
    fn test_legacy_layout_decodes_single_username() {
        let record = PeerRecord::new(123, 456, "user")
            .with_usernames(["alice", "bob"])
            .with_phone_number("+1");
        let legacy = record.encode_legacy();
        assert_ne!(legacy[0], PEER_FORMAT_V2);

        let decoded = PeerRecord::decode(&legacy).unwrap();
        assert_eq!(decoded.id, 123);
        assert_eq!(decoded.access_hash, 456);
        assert_eq!(decoded.usernames, Some(vec!["alice".to_string()]));
        assert_eq!(decoded.phone_number.as_deref(), Some("+1"));
    }

    #[test]
    fn test_legacy_without_optionals() {
        let record = PeerRecord::new(9, 10, "chat");
        let decoded = PeerRecord::decode(&record.encode_legacy()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_truncated_buffer_fails() {
        let bytes = PeerRecord::new(123, 456, "user")
            .with_usernames(["alice"])
            .encode();

        for len in [0, 1, 5, 12, bytes.len() - 1] {
            assert!(
                matches!(
                    PeerRecord::decode(&bytes[..len]),
                    Err(DecodeError::UnexpectedEof { .. })
                ),
                "length {} should fail",
                len
            );
        }
    }

    #[test]
    fn test_negative_username_count_fails() {
        let mut writer = TlWriter::new();
        writer.write_u8(PEER_FORMAT_V2);
        writer.write_u32(FLAG_USERNAMES);
        writer.write_i64(1);
        writer.write_i64(2);
        writer.write_string("user");
        writer.write_u32(crate::tl::VECTOR);
        writer.write_i32(-5);

        assert_eq!(
            PeerRecord::decode(&writer.into_bytes()),
            Err(DecodeError::InvalidLength(-5))
        );
    }

    #[test]
    fn test_username_matching() {
        let record = PeerRecord::new(1, 1, "user").with_usernames(["alice", "Bob"]);
        assert!(record.matches_username("bob"));
        assert!(record.matches_username("ALICE"));
        assert!(!record.matches_username("carol"));
        assert!(!PeerRecord::new(1, 1, "user").matches_username("bob"));
    }

    #[test]
    fn test_phone_matching_is_exact() {
        let record = PeerRecord::new(1, 1, "user").with_phone_number("+15550001111");
        assert!(record.matches_phone_number("+15550001111"));
        assert!(!record.matches_phone_number("15550001111"));
    }
}
