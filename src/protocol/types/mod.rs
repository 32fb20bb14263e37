//! Oracle data types for bind metadata and values.

mod bind_var;
mod oracle_type;
mod value;

pub use bind_var::BindMetadata;
pub use oracle_type::OracleType;
pub use value::OracleValue;
