//! Oracle value types for bind values and results.

use chrono::NaiveDateTime;
use std::fmt;

/// Oracle value enum representing a single bind value.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleValue {
    /// NULL value.
    Null,
    /// String value (VARCHAR2, LONG, UROWID, etc.).
    String(String),
    /// Number value as string (preserves precision).
    /// Can be converted to i64/f64 as needed.
    Number(String),
    /// Date/time value (DATE type).
    Date(NaiveDateTime),
    /// Raw binary value (RAW, LONG RAW).
    Raw(Vec<u8>),
}

impl OracleValue {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, OracleValue::Null)
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OracleValue::String(s) => Some(s),
            OracleValue::Number(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert to i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            OracleValue::Number(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            OracleValue::Number(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to get the value as a NaiveDateTime.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            OracleValue::Date(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Try to get the value as raw bytes.
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            OracleValue::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Name of the variant, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            OracleValue::Null => "NULL",
            OracleValue::String(_) => "string",
            OracleValue::Number(_) => "number",
            OracleValue::Date(_) => "date",
            OracleValue::Raw(_) => "raw",
        }
    }
}

impl fmt::Display for OracleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleValue::Null => write!(f, "NULL"),
            OracleValue::String(s) => write!(f, "{}", s),
            OracleValue::Number(n) => write!(f, "{}", n),
            OracleValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            OracleValue::Raw(bytes) => write!(f, "<RAW: {} bytes>", bytes.len()),
        }
    }
}

impl From<&str> for OracleValue {
    fn from(value: &str) -> Self {
        OracleValue::String(value.to_string())
    }
}

impl From<String> for OracleValue {
    fn from(value: String) -> Self {
        OracleValue::String(value)
    }
}

impl From<&String> for OracleValue {
    fn from(value: &String) -> Self {
        OracleValue::String(value.clone())
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for OracleValue {
                fn from(value: $t) -> Self {
                    OracleValue::Number(value.to_string())
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, f64);

impl From<NaiveDateTime> for OracleValue {
    fn from(value: NaiveDateTime) -> Self {
        OracleValue::Date(value)
    }
}

impl From<Vec<u8>> for OracleValue {
    fn from(value: Vec<u8>) -> Self {
        OracleValue::Raw(value)
    }
}

impl From<&[u8]> for OracleValue {
    fn from(value: &[u8]) -> Self {
        OracleValue::Raw(value.to_vec())
    }
}

impl<T: Into<OracleValue>> From<Option<T>> for OracleValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(OracleValue::Null, Into::into)
    }
}
