//! Cursor over received TTC data.

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use bytes::{Bytes, BytesMut};

/// A buffer for reading TTC protocol data.
pub struct ReadBuffer {
    data: Bytes,
    pos: usize,
}

impl ReadBuffer {
    /// Create a new read buffer from bytes.
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Get the current position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the remaining bytes in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if the buffer has at least `n` bytes remaining.
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    #[track_caller]
    fn ensure(&self, n: usize) -> Result<()> {
        if !self.has_remaining(n) {
            return Err(Error::truncated(n, self.remaining()));
        }
        Ok(())
    }

    /// Skip `n` bytes.
    #[track_caller]
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read a single byte.
    #[track_caller]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let val = self.data[self.pos];
        self.pos += 1;
        Ok(val)
    }

    /// Read a big-endian u16.
    #[track_caller]
    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.ensure(2)?;
        let val = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(val)
    }

    /// Read raw bytes.
    #[track_caller]
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n)?;
        let bytes = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }

    #[track_caller]
    fn read_var_int(&mut self, max_len: u8, kind: &str) -> Result<u64> {
        let length = self.read_u8()?;
        if length & 0x80 != 0 || length > max_len {
            return Err(Error::protocol(format!(
                "Invalid {} length (negative or too large): {}",
                kind, length
            )));
        }
        let mut val: u64 = 0;
        // Big-endian: first byte is most significant
        for _ in 0..length {
            val = (val << 8) | (self.read_u8()? as u64);
        }
        Ok(val)
    }

    /// Read a variable-length u16 (Oracle's UB2 format).
    #[track_caller]
    pub fn read_ub2(&mut self) -> Result<u16> {
        Ok(self.read_var_int(2, "UB2")? as u16)
    }

    /// Read a variable-length u32 (Oracle's UB4 format).
    #[track_caller]
    pub fn read_ub4(&mut self) -> Result<u32> {
        Ok(self.read_var_int(4, "UB4")? as u32)
    }

    /// Read a variable-length u64 (Oracle's UB8 format).
    #[track_caller]
    pub fn read_ub8(&mut self) -> Result<u64> {
        self.read_var_int(8, "UB8")
    }

    /// Read bytes with a length prefix. `None` is SQL NULL.
    ///
    /// Short values are returned as a zero-copy slice of the buffer; chunked
    /// long values are reassembled.
    #[track_caller]
    pub fn read_bytes_with_length(&mut self) -> Result<Option<Bytes>> {
        let length = self.read_u8()?;
        if length == TNS_NULL_LENGTH_INDICATOR {
            return Ok(None);
        }
        if length == TNS_LONG_LENGTH_INDICATOR {
            let mut result = BytesMut::new();
            loop {
                let chunk_len = self.read_ub4()? as usize;
                if chunk_len == 0 {
                    break;
                }
                if chunk_len > TNS_CHUNK_SIZE {
                    return Err(Error::protocol(format!(
                        "Chunk of {} bytes exceeds the {} byte limit",
                        chunk_len, TNS_CHUNK_SIZE
                    )));
                }
                let chunk = self.read_bytes(chunk_len)?;
                result.extend_from_slice(&chunk);
            }
            return Ok(Some(result.freeze()));
        }
        let data = self.read_bytes(length as usize)?;
        Ok(Some(data))
    }

    /// Read a UTF-8 string with a length prefix.
    #[track_caller]
    pub fn read_str_with_length(&mut self) -> Result<Option<String>> {
        match self.read_bytes_with_length()? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| Error::type_conversion(format!("Invalid UTF-8 text: {}", e))),
            None => Ok(None),
        }
    }
}
