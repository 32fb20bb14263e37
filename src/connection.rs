//! High-level Connection API for executing statements with binds.

use crate::backend::Backend;
use crate::bind::{BindSet, BoundCall, ExecutionResult};
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::message::DataMessage;
use crate::protocol::messages::ExecuteMessage;
use crate::protocol::response::parse_execute_response;

/// Characters of SQL text included in log events.
const SQL_PREVIEW_LEN: usize = 60;

/// A connection to a backend.
///
/// One statement runs at a time; `execute` holds `&mut self` until the
/// backend has answered and every returned value is decoded.
#[derive(Debug)]
pub struct Connection<B> {
    backend: B,
    config: ConnectionConfig,
    /// Sequence number of the last call (never 0 on the wire).
    sequence: u8,
}

impl<B: Backend> Connection<B> {
    /// Create a connection with default settings.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ConnectionConfig::default())
    }

    /// Create a connection with explicit settings.
    pub fn with_config(backend: B, config: ConnectionConfig) -> Self {
        Self {
            backend,
            config,
            sequence: 0,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn next_sequence(&mut self) -> u8 {
        self.sequence = self.sequence.wrapping_add(1);
        if self.sequence == 0 {
            self.sequence = 1;
        }
        self.sequence
    }

    /// Execute a SQL statement or PL/SQL block with binds.
    ///
    /// Every OUT and IN/OUT bind comes back in the result; if anything fails
    /// no partial result is returned.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use oracle_binds::{BindDescriptor, BindSet, BindType, Connection, MemoryBackend};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let mut conn = Connection::new(MemoryBackend::new());
    ///     let binds = BindSet::new()
    ///         .bind("i", BindDescriptor::input(1))
    ///         .bind("c", BindDescriptor::output(BindType::String, Some(4000)));
    ///     let result = conn
    ///         .execute("BEGIN nodb_long_bindout_proc_1 (:i, :c); END;", binds)
    ///         .await?;
    ///     println!("{:?}", result.out_str("c"));
    ///     Ok(())
    /// }
    /// ```
    pub async fn execute(&mut self, sql: &str, binds: BindSet) -> Result<ExecutionResult> {
        let preview: String = sql.chars().take(SQL_PREVIEW_LEN).collect();
        tracing::debug!(sql = %preview, binds = binds.len(), "execute");

        let mut call = BoundCall::bind(binds, &self.config)?;
        let seq = self.next_sequence();
        let request = ExecuteMessage::new(sql, seq, call.metadata(), call.values()).to_data_bytes()?;
        tracing::trace!(seq, bytes = request.len(), "sending execute");

        let response = match self.config.call_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.backend.execute(request))
                .await
                .map_err(|_| Error::CallTimeout { timeout })??,
            None => self.backend.execute(request).await?,
        };
        call.executed()?;

        let mut buf = ReadBuffer::new(response);
        let _data_flags = buf.read_u16_be()?;
        let response = parse_execute_response(&mut buf)?;

        let info = response.error_info;
        if info.error_num != 0 {
            let message = info.message.unwrap_or_default();
            tracing::warn!(code = info.error_num, %message, sql = %preview, "execute failed");
            return Err(Error::oracle(info.error_num, message));
        }

        call.complete(response.out_values, info.row_count)
    }
}
