//! TTC message definitions.
//!
//! Each message implements the `Message` trait for single-allocation serialization.

pub mod execute;
pub mod reply;

pub use execute::{is_plsql, ExecuteMessage, ExecuteRequest};
pub use reply::ExecuteReply;
