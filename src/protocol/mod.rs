//! TTC-style wire codec for bind execution.

pub mod buffer;
pub mod constants;
pub mod decode;
pub mod message;
pub mod messages;
pub mod response;
pub mod types;

pub use buffer::ReadBuffer;
pub use message::{DataMessage, Message, WriteExt};
pub use messages::{ExecuteMessage, ExecuteReply, ExecuteRequest};
pub use types::{BindMetadata, OracleType, OracleValue};
