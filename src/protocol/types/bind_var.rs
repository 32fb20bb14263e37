//! Per-bind metadata sent ahead of the bind values.
//!
//! The client tells the server, for every placeholder, which direction the
//! value flows, its Oracle type and how large a buffer the client reserved
//! for it. The server must never return more than `buffer_size` bytes.

use crate::error::Result;
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::*;
use crate::protocol::message::{str_with_length_wire_size, ub2_wire_size, ub4_wire_size, WriteExt};
use crate::protocol::types::OracleType;

/// Metadata for one bind variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMetadata {
    /// Placeholder name without the leading colon.
    pub name: String,
    /// Bind direction (TNS_BIND_DIR_INPUT, _OUTPUT, _INPUT_OUTPUT).
    pub direction: u8,
    /// Oracle data type number.
    pub ora_type_num: u8,
    /// Bind flags (TNS_BIND_USE_INDICATORS).
    pub flags: u8,
    /// Buffer size reserved for this bind.
    pub buffer_size: u32,
    /// Character set ID (873 for UTF8, 0 for binary).
    pub charset_id: u16,
    /// Character set form (1 for implicit, 0 for binary).
    pub charset_form: u8,
}

impl BindMetadata {
    /// Create bind metadata for a value of `ora_type`.
    ///
    /// Text types are sent in AL32UTF8 with the implicit charset form.
    pub fn new(name: impl Into<String>, direction: u8, ora_type: OracleType, buffer_size: u32) -> Self {
        let is_text = ora_type.is_text();
        Self {
            name: name.into(),
            direction,
            ora_type_num: ora_type.type_num(),
            flags: TNS_BIND_USE_INDICATORS,
            buffer_size,
            charset_id: if is_text { TNS_CHARSET_UTF8 } else { 0 },
            charset_form: if is_text { CS_FORM_IMPLICIT } else { 0 },
        }
    }

    /// Interpret the declared type number.
    pub fn oracle_type(&self) -> Result<OracleType> {
        OracleType::from_raw(self.ora_type_num, self.buffer_size)
    }

    /// Whether the client sends a value for this bind.
    pub fn is_input(&self) -> bool {
        self.direction & TNS_BIND_DIR_INPUT != 0
    }

    /// Whether the server returns a value for this bind.
    pub fn is_output(&self) -> bool {
        self.direction & TNS_BIND_DIR_OUTPUT != 0
    }

    pub fn wire_size(&self) -> usize {
        str_with_length_wire_size(&self.name)
            + 3 // direction, type, flags
            + ub4_wire_size(self.buffer_size)
            + ub2_wire_size(self.charset_id)
            + 1 // charset form
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.write_str_with_length(&self.name);
        buf.write_u8(self.direction);
        buf.write_u8(self.ora_type_num);
        buf.write_u8(self.flags);
        buf.write_ub4(self.buffer_size);
        buf.write_ub2(self.charset_id);
        buf.write_u8(self.charset_form);
    }

    pub fn read_from(buf: &mut ReadBuffer) -> Result<Self> {
        let name = buf.read_str_with_length()?.unwrap_or_default();
        Ok(Self {
            name,
            direction: buf.read_u8()?,
            ora_type_num: buf.read_u8()?,
            flags: buf.read_u8()?,
            buffer_size: buf.read_ub4()?,
            charset_id: buf.read_ub2()?,
            charset_form: buf.read_u8()?,
        })
    }
}
