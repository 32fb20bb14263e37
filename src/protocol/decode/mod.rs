//! Data type codecs for Oracle wire values.
//!
//! | Oracle Type | Module |
//! |-------------|--------|
//! | NUMBER      | `number` |
//! | DATE        | `date` |
//!
//! String types (VARCHAR2, LONG, UROWID) and RAW travel as plain bytes and
//! don't require dedicated codecs.

mod date;
mod number;

pub use date::{decode_oracle_date, encode_oracle_date};
pub use number::{decode_oracle_number, encode_oracle_number};
