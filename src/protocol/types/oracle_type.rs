//! Oracle data type enum with type-specific attributes.
//!
//! Used for table columns in the memory backend and to interpret the type
//! number a client declares for each bind.

use crate::error::{Error, Result};
use crate::protocol::constants::{
    ORA_TYPE_NUM_DATE, ORA_TYPE_NUM_LONG, ORA_TYPE_NUM_LONG_RAW, ORA_TYPE_NUM_NUMBER,
    ORA_TYPE_NUM_RAW, ORA_TYPE_NUM_ROWID, ORA_TYPE_NUM_UROWID, ORA_TYPE_NUM_VARCHAR,
    TNS_MAX_LONG_LENGTH, TNS_MAX_UROWID_LENGTH,
};

/// Oracle data type with type-specific attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleType {
    /// VARCHAR2(max_size) - variable-length string.
    Varchar2 { max_size: u32 },
    /// NUMBER - arbitrary precision decimal.
    Number,
    /// LONG - legacy large text type (up to 2 GiB).
    Long,
    /// UROWID(max_size) - universal row id, physical or logical.
    Urowid { max_size: u32 },
    /// RAW(max_size) - variable-length binary.
    Raw { max_size: u32 },
    /// LONG RAW - legacy large binary type.
    LongRaw,
    /// DATE - date/time (no timezone).
    Date,
}

impl OracleType {
    /// Create from a raw Oracle type number and its buffer size.
    ///
    /// Returns `Err(Error::UnsupportedType)` for unsupported types.
    pub fn from_raw(oracle_type: u8, max_size: u32) -> Result<Self> {
        match oracle_type as u16 {
            ORA_TYPE_NUM_VARCHAR => Ok(OracleType::Varchar2 { max_size }),
            ORA_TYPE_NUM_NUMBER => Ok(OracleType::Number),
            ORA_TYPE_NUM_LONG => Ok(OracleType::Long),
            ORA_TYPE_NUM_ROWID | ORA_TYPE_NUM_UROWID => Ok(OracleType::Urowid { max_size }),
            ORA_TYPE_NUM_RAW => Ok(OracleType::Raw { max_size }),
            ORA_TYPE_NUM_LONG_RAW => Ok(OracleType::LongRaw),
            ORA_TYPE_NUM_DATE => Ok(OracleType::Date),
            _ => Err(Error::UnsupportedType {
                type_num: oracle_type,
            }),
        }
    }

    /// Get the Oracle type number.
    pub fn type_num(&self) -> u8 {
        let num = match self {
            OracleType::Varchar2 { .. } => ORA_TYPE_NUM_VARCHAR,
            OracleType::Number => ORA_TYPE_NUM_NUMBER,
            OracleType::Long => ORA_TYPE_NUM_LONG,
            OracleType::Urowid { .. } => ORA_TYPE_NUM_UROWID,
            OracleType::Raw { .. } => ORA_TYPE_NUM_RAW,
            OracleType::LongRaw => ORA_TYPE_NUM_LONG_RAW,
            OracleType::Date => ORA_TYPE_NUM_DATE,
        };
        num as u8
    }

    /// Largest value, in bytes, a column of this type accepts.
    ///
    /// `None` for fixed-size types.
    pub fn max_size(&self) -> Option<u32> {
        match self {
            OracleType::Varchar2 { max_size } | OracleType::Raw { max_size } => Some(*max_size),
            OracleType::Urowid { max_size } => Some((*max_size).min(TNS_MAX_UROWID_LENGTH)),
            OracleType::Long | OracleType::LongRaw => Some(TNS_MAX_LONG_LENGTH),
            OracleType::Number | OracleType::Date => None,
        }
    }

    /// Whether values of this type are text.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            OracleType::Varchar2 { .. } | OracleType::Long | OracleType::Urowid { .. }
        )
    }

    /// Whether values of this type are binary.
    pub fn is_binary(&self) -> bool {
        matches!(self, OracleType::Raw { .. } | OracleType::LongRaw)
    }
}

impl std::fmt::Display for OracleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleType::Varchar2 { max_size } => write!(f, "VARCHAR2({})", max_size),
            OracleType::Number => write!(f, "NUMBER"),
            OracleType::Long => write!(f, "LONG"),
            OracleType::Urowid { max_size } => write!(f, "UROWID({})", max_size),
            OracleType::Raw { max_size } => write!(f, "RAW({})", max_size),
            OracleType::LongRaw => write!(f, "LONG RAW"),
            OracleType::Date => write!(f, "DATE"),
        }
    }
}
