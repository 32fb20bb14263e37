//! Response parsing for statement execution.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::*;

/// Information extracted from error/end-of-call response.
#[derive(Debug, Default)]
pub struct ErrorInfo {
    /// Error number (0 = success).
    pub error_num: u32,
    /// Row count for DML.
    pub row_count: u64,
    /// Error message (if any).
    pub message: Option<String>,
}

/// Result from parsing an execute response.
#[derive(Debug, Default)]
pub struct ExecuteResponse {
    /// Returned OUT and IN/OUT values keyed by bind position.
    pub out_values: Vec<(u16, Option<Bytes>)>,
    /// Error/status information.
    pub error_info: ErrorInfo,
}

/// Parse the response from an execute message.
///
/// Reads from the buffer after the data flags (2 bytes already consumed).
pub fn parse_execute_response(buf: &mut ReadBuffer) -> Result<ExecuteResponse> {
    let mut response = ExecuteResponse::default();
    let mut end_of_response = false;

    while buf.remaining() > 0 && !end_of_response {
        let msg_type = buf.read_u8()?;
        tracing::trace!(msg_type, remaining = buf.remaining(), "execute response message");

        match msg_type {
            TNS_MSG_TYPE_ROW_DATA => {
                parse_out_values(buf, &mut response.out_values)?;
            }
            TNS_MSG_TYPE_ERROR => {
                parse_error_info(buf, &mut response.error_info)?;
            }
            TNS_MSG_TYPE_END_OF_RESPONSE => {
                end_of_response = true;
            }
            _ => {
                return Err(Error::protocol(format!(
                    "Unexpected message type in execute response: {}",
                    msg_type
                )));
            }
        }
    }

    if !end_of_response {
        return Err(Error::protocol("Execute response ended without END_OF_RESPONSE"));
    }

    Ok(response)
}

/// Parse returned bind values (TNS_MSG_TYPE_ROW_DATA).
fn parse_out_values(buf: &mut ReadBuffer, out: &mut Vec<(u16, Option<Bytes>)>) -> Result<()> {
    let count = buf.read_ub2()?;
    out.reserve(count as usize);
    for _ in 0..count {
        let pos = buf.read_ub2()?;
        let value = buf.read_bytes_with_length()?;
        out.push((pos, value));
    }
    Ok(())
}

/// Parse error info from response.
fn parse_error_info(buf: &mut ReadBuffer, info: &mut ErrorInfo) -> Result<()> {
    info.error_num = buf.read_ub4()?;
    info.row_count = buf.read_ub8()?;
    let message = buf.read_str_with_length()?;
    if info.error_num != 0 {
        info.message = message;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{DataMessage, Message};
    use crate::protocol::messages::ExecuteReply;

    fn parse(reply: &ExecuteReply) -> Result<ExecuteResponse> {
        let mut buf = Vec::new();
        reply.write_to(&mut buf)?;
        parse_execute_response(&mut ReadBuffer::new(Bytes::from(buf)))
    }

    #[test]
    fn test_parse_success_with_out_values() {
        let reply = ExecuteReply::success(
            vec![(1, Some(Bytes::from_static(b"hello"))), (2, None)],
            3,
        );
        let response = parse(&reply).unwrap();
        assert_eq!(response.out_values.len(), 2);
        assert_eq!(response.out_values[0].1.as_deref(), Some(&b"hello"[..]));
        assert_eq!(response.out_values[1], (2, None));
        assert_eq!(response.error_info.error_num, 0);
        assert_eq!(response.error_info.row_count, 3);
        assert!(response.error_info.message.is_none());
    }

    #[test]
    fn test_parse_error() {
        let reply = ExecuteReply::error(1008, "not all variables bound");
        let response = parse(&reply).unwrap();
        assert_eq!(response.error_info.error_num, 1008);
        assert_eq!(
            response.error_info.message.as_deref(),
            Some("not all variables bound")
        );
    }

    #[test]
    fn test_unknown_message_type() {
        let mut buf = ReadBuffer::new(Bytes::from_static(&[0x42]));
        assert!(matches!(
            parse_execute_response(&mut buf),
            Err(Error::Protocol { .. })
        ));
    }

    #[test]
    fn test_missing_end_of_response() {
        let mut buf = ReadBuffer::new(Bytes::from_static(&[TNS_MSG_TYPE_ERROR, 0, 0, 0]));
        assert!(parse_execute_response(&mut buf).is_err());
    }

    #[test]
    fn test_truncated_out_value() {
        let reply = ExecuteReply::success(vec![(0, Some(Bytes::from(vec![1u8; 300])))], 0);
        let bytes = reply.to_data_bytes().unwrap();
        let cut = bytes.slice(2..bytes.len() / 2);
        assert!(matches!(
            parse_execute_response(&mut ReadBuffer::new(cut)),
            Err(Error::Truncated { .. })
        ));
    }
}
