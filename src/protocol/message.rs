//! Message traits and builders for TTC serialization.
//!
//! Messages implement the `Message` trait which allows calculating wire size before
//! allocation, enabling single-allocation serialization.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::constants::*;

// ============================================================================
// Core Traits
// ============================================================================

/// A message that can calculate its wire size and serialize to bytes.
///
/// Implementing this trait allows messages to be serialized with a single allocation:
/// 1. Call `wire_size()` to determine buffer capacity needed
/// 2. Allocate buffer with exact capacity
/// 3. Call `write_to()` to serialize directly into buffer
pub trait Message {
    /// Calculate the serialized size in bytes.
    fn wire_size(&self) -> usize;

    /// Write message content to buffer.
    ///
    /// The caller guarantees the buffer has sufficient capacity (from `wire_size()`).
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()>;
}

/// A DATA message that includes a data_flags prefix.
pub trait DataMessage: Message {
    /// Get the data flags for this message.
    fn data_flags(&self) -> u16 {
        0
    }

    /// Total wire size including the 2-byte data_flags prefix.
    fn data_wire_size(&self) -> usize {
        2 + self.wire_size()
    }

    /// Serialize flags and content into a single frozen buffer.
    fn to_data_bytes(&self) -> Result<Bytes> {
        let size = self.data_wire_size();
        let mut buf = Vec::with_capacity(size);
        buf.write_u16_be(self.data_flags());
        self.write_to(&mut buf)?;
        if buf.len() != size {
            return Err(Error::protocol(format!(
                "Message size mismatch: computed {}, wrote {}",
                size,
                buf.len()
            )));
        }
        Ok(Bytes::from(buf))
    }
}

// ============================================================================
// Size Calculation Helpers
// ============================================================================

/// Calculate wire size for a UB2 value in TNS variable-length format.
#[inline]
pub const fn ub2_wire_size(val: u16) -> usize {
    match val {
        0 => 1,
        1..=0xFF => 2,
        _ => 3,
    }
}

/// Calculate wire size for a UB4 value in TNS variable-length format.
///
/// Format: length byte + value bytes
/// - 0: 1 byte
/// - 1-255: 2 bytes
/// - 256-65535: 3 bytes
/// - 65536-16777215: 4 bytes
/// - 16777216+: 5 bytes
#[inline]
pub const fn ub4_wire_size(val: u32) -> usize {
    match val {
        0 => 1,
        1..=0xFF => 2,
        0x100..=0xFFFF => 3,
        0x10000..=0xFFFFFF => 4,
        _ => 5,
    }
}

/// Calculate wire size for a UB8 value in TNS variable-length format.
#[inline]
pub const fn ub8_wire_size(val: u64) -> usize {
    match val {
        0 => 1,
        1..=0xFF => 2,
        0x100..=0xFFFF => 3,
        0x10000..=0xFFFFFF => 4,
        0x1000000..=0xFFFFFFFF => 5,
        0x100000000..=0xFFFFFFFFFF => 6,
        0x10000000000..=0xFFFFFFFFFFFF => 7,
        0x1000000000000..=0xFFFFFFFFFFFFFF => 8,
        _ => 9,
    }
}

/// Calculate wire size for bytes with length prefix.
///
/// Format depends on length:
/// - 0: 1 byte (0x00, NULL)
/// - 1-253: 1 + len bytes
/// - 254+: 0xFE marker, then ub4-prefixed chunks of at most 64 KiB, then ub4(0)
#[inline]
pub const fn bytes_with_length_wire_size(len: usize) -> usize {
    if len == 0 {
        return 1;
    }
    if len < TNS_LONG_LENGTH_INDICATOR as usize {
        return 1 + len;
    }
    let mut size = 1;
    let mut remaining = len;
    while remaining > 0 {
        let chunk = if remaining > TNS_CHUNK_SIZE {
            TNS_CHUNK_SIZE
        } else {
            remaining
        };
        size += ub4_wire_size(chunk as u32) + chunk;
        remaining -= chunk;
    }
    size + 1
}

/// Calculate wire size for a string with length prefix.
#[inline]
pub const fn str_with_length_wire_size(s: &str) -> usize {
    bytes_with_length_wire_size(s.len())
}

// ============================================================================
// Write Helpers
// ============================================================================

/// Extension trait for writing TTC data to Vec<u8>.
pub trait WriteExt {
    /// Write a single byte.
    fn write_u8(&mut self, val: u8);

    /// Write a big-endian u16.
    fn write_u16_be(&mut self, val: u16);

    /// Write raw bytes.
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Write a UB2 value in TNS variable-length format.
    fn write_ub2(&mut self, val: u16);

    /// Write a UB4 value in TNS variable-length format.
    fn write_ub4(&mut self, val: u32);

    /// Write a UB8 value in TNS variable-length format.
    fn write_ub8(&mut self, val: u64);

    /// Write bytes with length prefix.
    fn write_bytes_with_length(&mut self, bytes: &[u8]);

    /// Write string with length prefix.
    fn write_str_with_length(&mut self, s: &str);

    /// Write an optional value; `None` is the NULL indicator.
    fn write_nullable(&mut self, bytes: Option<&[u8]>);
}

impl WriteExt for Vec<u8> {
    #[inline]
    fn write_u8(&mut self, val: u8) {
        self.push(val);
    }

    #[inline]
    fn write_u16_be(&mut self, val: u16) {
        self.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn write_ub2(&mut self, val: u16) {
        if val == 0 {
            self.push(0);
        } else if val <= 0xFF {
            self.push(1);
            self.push(val as u8);
        } else {
            // Big-endian: high byte first
            self.push(2);
            self.push((val >> 8) as u8);
            self.push(val as u8);
        }
    }

    fn write_ub4(&mut self, val: u32) {
        if val == 0 {
            self.push(0);
        } else {
            let bytes = val.to_be_bytes();
            let leading = (val.leading_zeros() / 8) as usize;
            self.push((4 - leading) as u8);
            self.extend_from_slice(&bytes[leading..]);
        }
    }

    fn write_ub8(&mut self, val: u64) {
        if val == 0 {
            self.push(0);
        } else {
            let bytes = val.to_be_bytes();
            let leading = (val.leading_zeros() / 8) as usize;
            self.push((8 - leading) as u8);
            self.extend_from_slice(&bytes[leading..]);
        }
    }

    fn write_bytes_with_length(&mut self, bytes: &[u8]) {
        let len = bytes.len();
        if len == 0 {
            self.push(TNS_NULL_LENGTH_INDICATOR);
        } else if len < TNS_LONG_LENGTH_INDICATOR as usize {
            self.push(len as u8);
            self.extend_from_slice(bytes);
        } else {
            self.push(TNS_LONG_LENGTH_INDICATOR);
            for chunk in bytes.chunks(TNS_CHUNK_SIZE) {
                self.write_ub4(chunk.len() as u32);
                self.extend_from_slice(chunk);
            }
            self.write_ub4(0); // End marker
        }
    }

    #[inline]
    fn write_str_with_length(&mut self, s: &str) {
        self.write_bytes_with_length(s.as_bytes());
    }

    #[inline]
    fn write_nullable(&mut self, bytes: Option<&[u8]>) {
        self.write_bytes_with_length(bytes.unwrap_or_default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ub4_wire_size() {
        assert_eq!(ub4_wire_size(0), 1);
        assert_eq!(ub4_wire_size(255), 2);
        assert_eq!(ub4_wire_size(256), 3);
        assert_eq!(ub4_wire_size(65536), 4);
        assert_eq!(ub4_wire_size(u32::MAX), 5);
    }

    #[test]
    fn test_write_ub2() {
        let mut buf = Vec::new();
        buf.write_ub2(0x1234);
        assert_eq!(buf, vec![2, 0x12, 0x34]);
    }

    #[test]
    fn test_write_ub4() {
        let mut buf = Vec::new();

        buf.write_ub4(0);
        assert_eq!(buf, vec![0]);

        buf.clear();
        buf.write_ub4(0x12345678);
        assert_eq!(buf, vec![4, 0x12, 0x34, 0x56, 0x78]);

        // PARSE|BIND|EXECUTE|PLSQL_BIND
        buf.clear();
        buf.write_ub4(0x429);
        assert_eq!(buf, vec![2, 0x04, 0x29]);
    }

    #[test]
    fn test_write_bytes_with_length_short() {
        let mut buf = Vec::new();

        buf.write_bytes_with_length(&[]);
        assert_eq!(buf, vec![0]);

        buf.clear();
        buf.write_bytes_with_length(&[1, 2, 3]);
        assert_eq!(buf, vec![3, 1, 2, 3]);

        buf.clear();
        buf.write_nullable(None);
        assert_eq!(buf, vec![TNS_NULL_LENGTH_INDICATOR]);
    }

    #[test]
    fn test_write_bytes_with_length_chunked() {
        let mut buf = Vec::new();
        let data = vec![b'x'; 32767];
        buf.write_bytes_with_length(&data);

        assert_eq!(buf[0], TNS_LONG_LENGTH_INDICATOR);
        // ub4(32767) = [2, 0x7F, 0xFF]
        assert_eq!(&buf[1..4], &[2, 0x7F, 0xFF]);
        assert_eq!(*buf.last().unwrap(), 0);
    }

    #[test]
    fn test_wire_size_matches_written() {
        let mut buf = Vec::new();

        for val in [0u32, 1, 255, 256, 65535, 65536, 0xFFFFFF, 0x1000000, u32::MAX] {
            buf.clear();
            buf.write_ub4(val);
            assert_eq!(buf.len(), ub4_wire_size(val), "UB4 mismatch for {}", val);
        }

        for val in [0u64, 1, 0xFFFF_FFFF, 0x1_0000_0000, u64::MAX] {
            buf.clear();
            buf.write_ub8(val);
            assert_eq!(buf.len(), ub8_wire_size(val), "UB8 mismatch for {}", val);
        }

        for len in [0, 1, 253, 254, 4000, 32767, 65536, 65537, 200_000] {
            buf.clear();
            buf.write_bytes_with_length(&vec![7u8; len]);
            assert_eq!(
                buf.len(),
                bytes_with_length_wire_size(len),
                "bytes_with_length mismatch for len={}",
                len
            );
        }
    }
}
