use bytes::Buf;

use super::{BOOL_FALSE, BOOL_TRUE, LONG_LEN_MARKER, VECTOR};
use crate::error::DecodeError;

type Result<T> = std::result::Result<T, DecodeError>;

/// Cursor over a TL-encoded buffer.
///
/// Every read checks the remaining length first, so a truncated buffer
/// yields [`DecodeError::UnexpectedEof`] instead of a panic.
#[derive(Debug, Clone)]
pub struct TlReader<'a> {
    buf: &'a [u8],
}

impl<'a> TlReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.buf.first().copied()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(DecodeError::UnexpectedEof {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64_le())
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.ensure(8)?;
        Ok(self.buf.get_f64_le())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u32()? {
            BOOL_TRUE => Ok(true),
            BOOL_FALSE => Ok(false),
            other => Err(DecodeError::InvalidBool(other)),
        }
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let first = self.read_u8()?;
        let (header, len) = if first == LONG_LEN_MARKER {
            self.ensure(3)?;
            let mut len = [0u8; 4];
            self.buf.copy_to_slice(&mut len[..3]);
            (4, u32::from_le_bytes(len) as usize)
        } else {
            (1, first as usize)
        };

        self.ensure(len)?;
        let data = self.buf[..len].to_vec();
        self.buf.advance(len);

        let padding = (4 - (header + len) % 4) % 4;
        self.ensure(padding)?;
        self.buf.advance(padding);

        Ok(data)
    }

    pub fn read_string(&mut self) -> Result<String> {
        String::from_utf8(self.read_bytes()?).map_err(|_| DecodeError::InvalidUtf8)
    }

    pub fn read_string_vector(&mut self) -> Result<Vec<String>> {
        let constructor = self.read_u32()?;
        if constructor != VECTOR {
            return Err(DecodeError::InvalidVectorConstructor(constructor));
        }

        let count = self.read_i32()?;
        if count < 0 {
            return Err(DecodeError::InvalidLength(count));
        }
        let count = count as usize;
        // Each element takes at least 4 bytes; reject impossible counts up front.
        self.ensure(count.saturating_mul(4))?;

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_string()?);
        }
        Ok(values)
    }
}
