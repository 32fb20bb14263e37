//! Execute message for SQL and PL/SQL statements with binds.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::*;
use crate::protocol::message::{
    bytes_with_length_wire_size, ub4_wire_size, DataMessage, Message, WriteExt,
};
use crate::protocol::types::BindMetadata;

/// Execute message for a statement and its binds.
///
/// Wire layout after the data flags:
/// ```text
/// FUNCTION, EXECUTE, sequence
/// options: ub4
/// num_binds: ub4
/// sql: bytes with length
/// bind metadata * num_binds
/// ROW_DATA
/// value with length * num_binds   (0 = NULL)
/// ```
pub struct ExecuteMessage<'a> {
    /// SQL statement text.
    pub sql: &'a str,
    /// sequence number
    sequence_number: u8,
    /// Whether the statement is a PL/SQL block.
    pub is_plsql: bool,
    /// Metadata for every bind, in placeholder order.
    pub binds: &'a [BindMetadata],
    /// Encoded value for every bind; `None` for NULL and for OUT binds.
    pub values: &'a [Option<Bytes>],
}

impl<'a> ExecuteMessage<'a> {
    /// Create a new execute message.
    ///
    /// PL/SQL is detected from the leading keyword of `sql`.
    pub fn new(
        sql: &'a str,
        sequence_number: u8,
        binds: &'a [BindMetadata],
        values: &'a [Option<Bytes>],
    ) -> Self {
        Self {
            sql,
            sequence_number,
            is_plsql: is_plsql(sql),
            binds,
            values,
        }
    }

    /// Calculate the options flags for this execution.
    fn calc_options(&self) -> u32 {
        let mut options = TNS_EXEC_OPTION_PARSE | TNS_EXEC_OPTION_EXECUTE;
        if !self.binds.is_empty() {
            options |= TNS_EXEC_OPTION_BIND;
        }
        if self.is_plsql {
            options |= TNS_EXEC_OPTION_PLSQL_BIND;
        } else {
            options |= TNS_EXEC_OPTION_NOT_PLSQL;
        }
        options
    }

    fn value(&self, index: usize) -> Option<&[u8]> {
        self.values.get(index).and_then(|v| v.as_deref())
    }
}

/// Whether `sql` is an anonymous PL/SQL block or a CALL.
pub fn is_plsql(sql: &str) -> bool {
    let keyword: String = sql
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    matches!(
        keyword.to_ascii_uppercase().as_str(),
        "BEGIN" | "DECLARE" | "CALL"
    )
}

impl Message for ExecuteMessage<'_> {
    fn wire_size(&self) -> usize {
        let mut size = 0;

        // Function header
        size += 1; // message type (TNS_MSG_TYPE_FUNCTION)
        size += 1; // function code (TNS_FUNC_EXECUTE)
        size += 1; // sequence number

        size += ub4_wire_size(self.calc_options());
        size += ub4_wire_size(self.binds.len() as u32);
        size += bytes_with_length_wire_size(self.sql.len());

        size += self.binds.iter().map(BindMetadata::wire_size).sum::<usize>();

        // Bind values
        size += 1; // TNS_MSG_TYPE_ROW_DATA
        for i in 0..self.binds.len() {
            size += bytes_with_length_wire_size(self.value(i).map_or(0, <[u8]>::len));
        }

        size
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        if self.values.len() != self.binds.len() {
            return Err(Error::protocol(format!(
                "{} bind values for {} binds",
                self.values.len(),
                self.binds.len()
            )));
        }

        buf.write_u8(TNS_MSG_TYPE_FUNCTION);
        buf.write_u8(TNS_FUNC_EXECUTE);
        buf.write_u8(self.sequence_number);

        buf.write_ub4(self.calc_options());
        buf.write_ub4(self.binds.len() as u32);
        buf.write_str_with_length(self.sql);

        for bind in self.binds {
            bind.write_to(buf);
        }

        buf.write_u8(TNS_MSG_TYPE_ROW_DATA);
        for i in 0..self.binds.len() {
            buf.write_nullable(self.value(i));
        }

        Ok(())
    }
}

impl DataMessage for ExecuteMessage<'_> {
    fn data_flags(&self) -> u16 {
        TNS_DATA_FLAGS_END_OF_REQUEST
    }
}

/// An execute message as received by a backend.
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub sequence_number: u8,
    pub options: u32,
    pub sql: String,
    pub binds: Vec<BindMetadata>,
    pub values: Vec<Option<Bytes>>,
}

impl ExecuteRequest {
    /// Parse a request, including its data flags.
    pub fn parse(buf: &mut ReadBuffer) -> Result<Self> {
        let _data_flags = buf.read_u16_be()?;

        let msg_type = buf.read_u8()?;
        let function = buf.read_u8()?;
        if msg_type != TNS_MSG_TYPE_FUNCTION || function != TNS_FUNC_EXECUTE {
            return Err(Error::protocol(format!(
                "Expected execute function, got message type {} function {}",
                msg_type, function
            )));
        }
        let sequence_number = buf.read_u8()?;
        let options = buf.read_ub4()?;
        let num_binds = buf.read_ub4()? as usize;
        let sql = buf.read_str_with_length()?.unwrap_or_default();

        let mut binds = Vec::with_capacity(num_binds.min(buf.remaining()));
        for _ in 0..num_binds {
            binds.push(BindMetadata::read_from(buf)?);
        }

        let marker = buf.read_u8()?;
        if marker != TNS_MSG_TYPE_ROW_DATA {
            return Err(Error::protocol(format!(
                "Expected bind values, got message type {}",
                marker
            )));
        }
        let mut values = Vec::with_capacity(binds.len());
        for _ in 0..binds.len() {
            values.push(buf.read_bytes_with_length()?);
        }

        Ok(Self {
            sequence_number,
            options,
            sql,
            binds,
            values,
        })
    }

    /// Whether the client flagged the statement as PL/SQL.
    pub fn is_plsql(&self) -> bool {
        self.options & TNS_EXEC_OPTION_PLSQL_BIND != 0
    }
}
