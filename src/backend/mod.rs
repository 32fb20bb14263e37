//! Backends that execute encoded requests.
//!
//! A backend is opaque to the connection: it receives one encoded execute
//! message and answers with one encoded reply.

mod memory;
mod table;

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

pub use memory::{Call, Handler, MemoryBackend};
pub use table::{Column, Table, TableDef, Tables};

/// Request/response transport for execute messages.
pub trait Backend {
    /// Execute one encoded request and return the encoded reply.
    ///
    /// Database errors are part of the reply; `Err` is reserved for
    /// transport and protocol failures.
    fn execute(&mut self, request: Bytes) -> impl Future<Output = Result<Bytes>> + Send;
}
