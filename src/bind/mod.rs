//! Bind descriptors, bind sets and execution results.
//!
//! A [`BindDescriptor`] is a tagged enum with one variant per direction, so
//! an OUT bind cannot carry an input value and an IN bind cannot carry a
//! `max_size`.
//!
//! ```
//! use oracle_binds::{BindDescriptor, BindSet, BindType};
//!
//! let binds = BindSet::new()
//!     .bind("id", BindDescriptor::input(1))
//!     .bind(":c", BindDescriptor::output(BindType::String, Some(32767)));
//! assert_eq!(binds.len(), 2);
//! ```

mod marshal;
mod state;

use std::fmt;

pub use marshal::{allocate_output_buffer, decode, encode, BoundCall, OutputBuffer, WireParam};
pub use state::BindState;

use crate::protocol::constants::{
    TNS_BIND_DIR_INPUT, TNS_BIND_DIR_INPUT_OUTPUT, TNS_BIND_DIR_OUTPUT,
};
use crate::protocol::types::OracleValue;

/// Client-side type a bind value is coerced to and from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindType {
    /// Oracle NUMBER, 22 bytes on the wire.
    Number,
    /// Character data (VARCHAR2, LONG, UROWID).
    String,
    /// Binary data (RAW, LONG RAW).
    Raw,
    /// Oracle DATE, 7 bytes on the wire.
    Date,
}

impl BindType {
    /// Whether OUT binds of this type must declare a `max_size`.
    pub fn is_variable_length(self) -> bool {
        matches!(self, BindType::String | BindType::Raw)
    }

    /// Type inferred for an untyped input value. NULL binds as a string.
    pub fn infer(value: &OracleValue) -> Self {
        match value {
            OracleValue::Null | OracleValue::String(_) => BindType::String,
            OracleValue::Number(_) => BindType::Number,
            OracleValue::Date(_) => BindType::Date,
            OracleValue::Raw(_) => BindType::Raw,
        }
    }
}

impl fmt::Display for BindType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindType::Number => "NUMBER",
            BindType::String => "STRING",
            BindType::Raw => "RAW",
            BindType::Date => "DATE",
        };
        f.write_str(name)
    }
}

/// Direction a bind value flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindDirection {
    In,
    Out,
    InOut,
}

impl BindDirection {
    /// Direction code sent in the bind metadata.
    pub fn wire_code(self) -> u8 {
        match self {
            BindDirection::In => TNS_BIND_DIR_INPUT,
            BindDirection::Out => TNS_BIND_DIR_OUTPUT,
            BindDirection::InOut => TNS_BIND_DIR_INPUT_OUTPUT,
        }
    }
}

/// One named parameter of a statement execution.
#[derive(Debug, Clone, PartialEq)]
pub enum BindDescriptor {
    /// Value sent to the server.
    In {
        bind_type: BindType,
        value: OracleValue,
    },
    /// Value returned by the server, at most `max_size` bytes.
    Out {
        bind_type: BindType,
        max_size: Option<u32>,
    },
    /// Value sent to the server and replaced by what it returns.
    InOut {
        bind_type: BindType,
        value: OracleValue,
        max_size: Option<u32>,
    },
}

impl BindDescriptor {
    /// IN bind whose type is inferred from the value.
    ///
    /// `None`, `Option::None` and `""` all bind as a NULL string.
    pub fn input(value: impl Into<OracleValue>) -> Self {
        let value = value.into();
        BindDescriptor::In {
            bind_type: BindType::infer(&value),
            value,
        }
    }

    /// IN bind coerced to `bind_type`.
    pub fn typed_input(bind_type: BindType, value: impl Into<OracleValue>) -> Self {
        BindDescriptor::In {
            bind_type,
            value: value.into(),
        }
    }

    /// OUT bind. `max_size` is required for `String` and `Raw`.
    pub fn output(bind_type: BindType, max_size: Option<u32>) -> Self {
        BindDescriptor::Out {
            bind_type,
            max_size,
        }
    }

    /// IN/OUT bind. `max_size` is required for `String` and `Raw`.
    pub fn input_output(
        bind_type: BindType,
        value: impl Into<OracleValue>,
        max_size: Option<u32>,
    ) -> Self {
        BindDescriptor::InOut {
            bind_type,
            value: value.into(),
            max_size,
        }
    }

    pub fn bind_type(&self) -> BindType {
        match self {
            BindDescriptor::In { bind_type, .. }
            | BindDescriptor::Out { bind_type, .. }
            | BindDescriptor::InOut { bind_type, .. } => *bind_type,
        }
    }

    pub fn direction(&self) -> BindDirection {
        match self {
            BindDescriptor::In { .. } => BindDirection::In,
            BindDescriptor::Out { .. } => BindDirection::Out,
            BindDescriptor::InOut { .. } => BindDirection::InOut,
        }
    }

    /// Input value, absent for OUT binds.
    pub fn value(&self) -> Option<&OracleValue> {
        match self {
            BindDescriptor::In { value, .. } | BindDescriptor::InOut { value, .. } => Some(value),
            BindDescriptor::Out { .. } => None,
        }
    }

    /// Declared maximum size, absent for IN binds.
    pub fn max_size(&self) -> Option<u32> {
        match self {
            BindDescriptor::Out { max_size, .. } | BindDescriptor::InOut { max_size, .. } => {
                *max_size
            }
            BindDescriptor::In { .. } => None,
        }
    }

    /// Whether the server returns a value for this bind.
    pub fn is_output(&self) -> bool {
        !matches!(self, BindDescriptor::In { .. })
    }
}

/// Strip a leading `:` from a placeholder name.
pub(crate) fn normalize_name(name: &str) -> &str {
    name.strip_prefix(':').unwrap_or(name)
}

/// Ordered set of named binds for one execution.
///
/// Names are checked when the set is bound: a blank name or two names that
/// differ only in case fail with `InvalidBind`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindSet {
    binds: Vec<(String, BindDescriptor)>,
}

impl BindSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bind. A leading `:` on the name is dropped.
    pub fn bind(mut self, name: impl Into<String>, descriptor: BindDescriptor) -> Self {
        self.push(name, descriptor);
        self
    }

    /// Add a bind in place.
    pub fn push(&mut self, name: impl Into<String>, descriptor: BindDescriptor) {
        let name = name.into();
        let name = normalize_name(&name).to_string();
        self.binds.push((name, descriptor));
    }

    pub fn len(&self) -> usize {
        self.binds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindDescriptor)> {
        self.binds.iter().map(|(name, desc)| (name.as_str(), desc))
    }
}

impl IntoIterator for BindSet {
    type Item = (String, BindDescriptor);
    type IntoIter = std::vec::IntoIter<(String, BindDescriptor)>;

    fn into_iter(self) -> Self::IntoIter {
        self.binds.into_iter()
    }
}

/// Outcome of one statement execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    /// Decoded OUT and IN/OUT values in bind order.
    pub out_binds: Vec<(String, OracleValue)>,
    /// Rows affected by DML.
    pub rows_affected: u64,
}

impl ExecutionResult {
    /// Look up a returned value by name (case-insensitive, `:` optional).
    pub fn out_bind(&self, name: &str) -> Option<&OracleValue> {
        let name = normalize_name(name);
        self.out_binds
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Returned value as text; `None` for NULL or a missing bind.
    pub fn out_str(&self, name: &str) -> Option<&str> {
        self.out_bind(name).and_then(OracleValue::as_str)
    }
}
