//! Execute reply written by a backend.

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::constants::*;
use crate::protocol::message::{
    bytes_with_length_wire_size, str_with_length_wire_size, ub2_wire_size, ub4_wire_size,
    ub8_wire_size, DataMessage, Message, WriteExt,
};

/// Reply to an execute message.
///
/// ```text
/// [ROW_DATA, count: ub2, (position: ub2, value with length) * count]
/// ERROR, error_num: ub4, row_count: ub8, message: str with length
/// END_OF_RESPONSE
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecuteReply {
    /// Returned values keyed by zero-based bind position.
    pub out_values: Vec<(u16, Option<Bytes>)>,
    /// Error number (0 = success).
    pub error_num: u32,
    /// Rows affected by DML.
    pub row_count: u64,
    /// Error message (empty on success).
    pub message: String,
}

impl ExecuteReply {
    /// A successful reply.
    pub fn success(out_values: Vec<(u16, Option<Bytes>)>, row_count: u64) -> Self {
        Self {
            out_values,
            row_count,
            ..Default::default()
        }
    }

    /// A failed reply. No out values are returned.
    pub fn error(error_num: u32, message: impl Into<String>) -> Self {
        Self {
            error_num,
            message: message.into(),
            ..Default::default()
        }
    }
}

impl Message for ExecuteReply {
    fn wire_size(&self) -> usize {
        let mut size = 0;
        if !self.out_values.is_empty() {
            size += 1; // TNS_MSG_TYPE_ROW_DATA
            size += ub2_wire_size(self.out_values.len() as u16);
            for (pos, value) in &self.out_values {
                size += ub2_wire_size(*pos);
                size += bytes_with_length_wire_size(value.as_ref().map_or(0, Bytes::len));
            }
        }
        size += 1; // TNS_MSG_TYPE_ERROR
        size += ub4_wire_size(self.error_num);
        size += ub8_wire_size(self.row_count);
        size += str_with_length_wire_size(&self.message);
        size += 1; // TNS_MSG_TYPE_END_OF_RESPONSE
        size
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        if !self.out_values.is_empty() {
            buf.write_u8(TNS_MSG_TYPE_ROW_DATA);
            buf.write_ub2(self.out_values.len() as u16);
            for (pos, value) in &self.out_values {
                buf.write_ub2(*pos);
                buf.write_nullable(value.as_deref());
            }
        }
        buf.write_u8(TNS_MSG_TYPE_ERROR);
        buf.write_ub4(self.error_num);
        buf.write_ub8(self.row_count);
        buf.write_str_with_length(&self.message);
        buf.write_u8(TNS_MSG_TYPE_END_OF_RESPONSE);
        Ok(())
    }
}

impl DataMessage for ExecuteReply {
    fn data_flags(&self) -> u16 {
        TNS_DATA_FLAGS_END_OF_RESPONSE
    }
}
