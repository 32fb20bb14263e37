//! Error types for bind marshalling and statement execution.

use std::io;
use std::panic::Location;
use std::time::Duration;
use thiserror::Error;

use crate::bind::BindState;

/// Result type alias for bind operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for bind marshalling and statement execution.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reported by a backend transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed bind descriptor.
    #[error("Invalid bind :{name}: {message}")]
    InvalidBind { name: String, message: String },

    /// The backend returned more data than the declared maxSize.
    #[error("Buffer too small for bind :{name}: need {needed} bytes, maxSize is {max_size}")]
    BufferTooSmall {
        name: String,
        needed: usize,
        max_size: usize,
    },

    /// Oracle database error returned by the backend.
    #[error("ORA-{code:05}: {message}")]
    Oracle { code: u32, message: String },

    /// Protocol error.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Wire data ended before a complete value was read.
    #[error("Truncated wire data: need {needed} bytes, have {available} at {location}")]
    Truncated {
        needed: usize,
        available: usize,
        location: &'static Location<'static>,
    },

    /// Type conversion error.
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Unsupported Oracle data type on the wire.
    #[error("Unsupported Oracle data type: {type_num}")]
    UnsupportedType { type_num: u8 },

    /// A bind skipped a lifecycle state.
    #[error("Bind :{name} cannot move from {from} to {to}")]
    InvalidState {
        name: String,
        from: BindState,
        to: BindState,
    },

    /// The backend did not answer within the configured call timeout.
    #[error("Call timed out after {timeout:?}")]
    CallTimeout { timeout: Duration },

    /// Invalid configuration value.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidConfig { key: String, value: String },
}

impl Error {
    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create an Oracle database error.
    pub fn oracle(code: u32, message: impl Into<String>) -> Self {
        Self::Oracle {
            code,
            message: message.into(),
        }
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
    }

    /// Create an invalid bind error.
    pub fn invalid_bind(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBind {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a truncated-data error recording the caller location.
    #[track_caller]
    pub(crate) fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated {
            needed,
            available,
            location: Location::caller(),
        }
    }

    /// Oracle error code, if this error came from the backend.
    pub fn oracle_code(&self) -> Option<u32> {
        match self {
            Self::Oracle { code, .. } => Some(*code),
            _ => None,
        }
    }
}
