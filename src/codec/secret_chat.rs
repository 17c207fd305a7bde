//! Secret-chat record codec
//!
//! Single layout, no version marker: flags, required fields, then optional
//! fields in flag order. There is no framing length or checksum, so field
//! order is the whole contract.

use crate::error::DecodeError;
use crate::tl::{TlReader, TlWriter};

const FLAG_REKEY_STEP: u32 = 1 << 3;
const FLAG_REKEY_EXCHANGE: u32 = 1 << 4;
const FLAG_ADMIN_ID: u32 = 1 << 5;
const FLAG_TTL: u32 = 1 << 6;

/// End-to-end session state of one secret chat.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretChatRecord {
    pub id: i32,
    pub access_hash: i64,
    pub is_admin: bool,
    pub auth_key: Vec<u8>,
    pub mtproto: i32,
    pub layer: i32,
    pub in_seq_no: i32,
    pub out_seq_no: i32,
    pub in_seq_no_x: i32,
    pub out_seq_no_x: i32,
    pub time_rekey: i32,
    /// Unix time, seconds
    pub created: f64,
    pub changed: f64,
    pub rekey_step: Option<i32>,
    pub rekey_exchange: Option<i64>,
    pub admin_id: Option<i64>,
    pub ttl: Option<i32>,
}

impl SecretChatRecord {
    fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.rekey_step.is_some() {
            flags |= FLAG_REKEY_STEP;
        }
        if self.rekey_exchange.is_some() {
            flags |= FLAG_REKEY_EXCHANGE;
        }
        if self.admin_id.is_some() {
            flags |= FLAG_ADMIN_ID;
        }
        if self.ttl.is_some() {
            flags |= FLAG_TTL;
        }
        flags
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut writer = TlWriter::with_capacity(128 + self.auth_key.len());
        writer.write_u32(self.flags());
        writer.write_i32(self.id);
        writer.write_i64(self.access_hash);
        writer.write_bool(self.is_admin);
        writer.write_bytes(&self.auth_key);
        writer.write_i32(self.mtproto);
        writer.write_i32(self.layer);
        writer.write_i32(self.in_seq_no);
        writer.write_i32(self.out_seq_no);
        writer.write_i32(self.in_seq_no_x);
        writer.write_i32(self.out_seq_no_x);
        writer.write_i32(self.time_rekey);
        writer.write_f64(self.created);
        writer.write_f64(self.changed);

        if let Some(rekey_step) = self.rekey_step {
            writer.write_i32(rekey_step);
        }
        if let Some(rekey_exchange) = self.rekey_exchange {
            writer.write_i64(rekey_exchange);
        }
        if let Some(admin_id) = self.admin_id {
            writer.write_i64(admin_id);
        }
        if let Some(ttl) = self.ttl {
            writer.write_i32(ttl);
        }
        writer.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = TlReader::new(bytes);
        // Bits outside 3..=6 are reserved and ignored.
        let flags = reader.read_u32()?;

        let mut record = Self {
            id: reader.read_i32()?,
            access_hash: reader.read_i64()?,
            is_admin: reader.read_bool()?,
            auth_key: reader.read_bytes()?,
            mtproto: reader.read_i32()?,
            layer: reader.read_i32()?,
            in_seq_no: reader.read_i32()?,
            out_seq_no: reader.read_i32()?,
            in_seq_no_x: reader.read_i32()?,
            out_seq_no_x: reader.read_i32()?,
            time_rekey: reader.read_i32()?,
            created: reader.read_f64()?,
            changed: reader.read_f64()?,
            rekey_step: None,
            rekey_exchange: None,
            admin_id: None,
            ttl: None,
        };

        if flags & FLAG_REKEY_STEP != 0 {
            record.rekey_step = Some(reader.read_i32()?);
        }
        if flags & FLAG_REKEY_EXCHANGE != 0 {
            record.rekey_exchange = Some(reader.read_i64()?);
        }
        if flags & FLAG_ADMIN_ID != 0 {
            record.admin_id = Some(reader.read_i64()?);
        }
        if flags & FLAG_TTL != 0 {
            record.ttl = Some(reader.read_i32()?);
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_record() -> SecretChatRecord {
        SecretChatRecord {
            id: 42,
            access_hash: -9_000_000_000,
            is_admin: true,
            auth_key: (0..=255u8).collect(),
            mtproto: 2,
            layer: 144,
            in_seq_no: 3,
            out_seq_no: 4,
            in_seq_no_x: 7,
            out_seq_no_x: 8,
            time_rekey: 1_700_000_100,
            created: 1_700_000_000.25,
            changed: 1_700_000_050.5,
            rekey_step: None,
            rekey_exchange: None,
            admin_id: None,
            ttl: None,
        }
    }

    #[test]
    fn test_roundtrip_every_optional_combination() {
        for mask in 0u8..16 {
            let mut record = base_record();
            if mask & 1 != 0 {
                record.rekey_step = Some(2);
            }
            if mask & 2 != 0 {
                record.rekey_exchange = Some(-77);
            }
            if mask & 4 != 0 {
                record.admin_id = Some(1_234_567_890_123);
            }
            if mask & 8 != 0 {
                record.ttl = Some(86_400);
            }

            let decoded = SecretChatRecord::decode(&record.encode()).unwrap();
            assert_eq!(decoded, record, "mask {:04b}", mask);
        }
    }

    #[test]
    fn test_flags_reflect_present_fields() {
        let mut record = base_record();
        record.admin_id = Some(1);
        record.ttl = Some(5);

        let bytes = record.encode();
        let flags = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(flags, FLAG_ADMIN_ID | FLAG_TTL);
    }

    #[test]
    fn test_absent_optionals_add_no_bytes() {
        let without = base_record().encode();
        let mut record = base_record();
        record.rekey_exchange = Some(1);
        let with = record.encode();

        assert_eq!(with.len(), without.len() + 8);
    }

    #[test]
    fn test_reserved_flag_bits_are_ignored() {
        let mut bytes = base_record().encode();
        bytes[0] |= 0x01;
        bytes[1] |= 0x10;

        let decoded = SecretChatRecord::decode(&bytes).unwrap();
        assert_eq!(decoded, base_record());
    }

    #[test]
    fn test_missing_flagged_field_fails() {
        let mut record = base_record();
        record.ttl = Some(10);
        let bytes = record.encode();

        assert!(matches!(
            SecretChatRecord::decode(&bytes[..bytes.len() - 2]),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }
}
