use bytes::{BufMut, BytesMut};

use super::{BOOL_FALSE, BOOL_TRUE, LONG_LEN_MARKER, SHORT_LEN_MAX, VECTOR};

/// Append-only TL writer backed by a growable buffer.
#[derive(Debug, Default)]
pub struct TlWriter {
    buf: BytesMut,
}

impl TlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u32(if value { BOOL_TRUE } else { BOOL_FALSE });
    }

    /// Length-prefixed bytes, zero-padded to a multiple of 4.
    pub fn write_bytes(&mut self, data: &[u8]) {
        let header = if data.len() <= SHORT_LEN_MAX {
            self.buf.put_u8(data.len() as u8);
            1
        } else {
            self.buf.put_u8(LONG_LEN_MARKER);
            let len = data.len() as u32;
            self.buf.put_slice(&len.to_le_bytes()[..3]);
            4
        };
        self.buf.put_slice(data);

        let padding = (4 - (header + data.len()) % 4) % 4;
        self.buf.put_bytes(0, padding);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    pub fn write_string_vector<S: AsRef<str>>(&mut self, values: &[S]) {
        self.write_u32(VECTOR);
        self.write_i32(values.len() as i32);
        for value in values {
            self.write_string(value.as_ref());
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_string_is_padded() {
        let mut writer = TlWriter::new();
        writer.write_string("abc");
        assert_eq!(writer.into_bytes(), vec![3, b'a', b'b', b'c']);

        let mut writer = TlWriter::new();
        writer.write_string("abcd");
        assert_eq!(writer.into_bytes(), vec![4, b'a', b'b', b'c', b'd', 0, 0, 0]);
    }

    #[test]
    fn test_long_bytes_use_three_byte_length() {
        let data = vec![7u8; 300];
        let mut writer = TlWriter::new();
        writer.write_bytes(&data);
        let out = writer.into_bytes();

        assert_eq!(&out[..4], &[0xfe, 0x2c, 0x01, 0x00]);
        assert_eq!(out.len(), 304);
    }

    #[test]
    fn test_integers_are_little_endian() {
        let mut writer = TlWriter::new();
        writer.write_i32(1);
        writer.write_i64(-2);
        writer.write_bool(true);
        let out = writer.into_bytes();

        assert_eq!(&out[..4], &[1, 0, 0, 0]);
        assert_eq!(&out[4..12], &[0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(&out[12..], &[0xb5, 0x75, 0x72, 0x99]);
    }

    #[test]
    fn test_empty_vector() {
        let mut writer = TlWriter::new();
        writer.write_string_vector::<&str>(&[]);
        assert_eq!(writer.into_bytes(), vec![0x15, 0xc4, 0xb5, 0x1c, 0, 0, 0, 0]);
    }
}
