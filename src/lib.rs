//! Bind marshalling for Oracle SQL and PL/SQL execution.
//!
//! Named IN, OUT and IN/OUT binds are validated, encoded into a TTC-style
//! execute message and sent to a [`Backend`]. Returned values are decoded
//! into an [`ExecutionResult`], never beyond the `max_size` each OUT bind
//! declares.
//!
//! # Example
//!
//! ```no_run
//! use oracle_binds::{
//!     BindDescriptor, BindSet, BindType, Connection, MemoryBackend, OracleType, Result, TableDef,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let db = MemoryBackend::new();
//!     db.create_table(
//!         TableDef::new("nodb_long_130")
//!             .column("id", OracleType::Number)
//!             .column("content", OracleType::Long),
//!     )
//!     .await?;
//!     db.register("BEGIN get_content(:i, :c); END;", |tables, call| {
//!         let id = call.get("i")?;
//!         let content = tables.get("nodb_long_130")?.select_one("content", "id", &id)?;
//!         call.set("c", content)?;
//!         Ok(0)
//!     })
//!     .await;
//!     db.insert("nodb_long_130", vec![1.into(), "hello".into()]).await?;
//!
//!     let mut conn = Connection::new(db);
//!     let binds = BindSet::new()
//!         .bind("i", BindDescriptor::input(1))
//!         .bind("c", BindDescriptor::output(BindType::String, Some(32767)));
//!     let result = conn.execute("BEGIN get_content(:i, :c); END;", binds).await?;
//!     assert_eq!(result.out_str("c"), Some("hello"));
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod bind;
pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;

// Re-export main types
pub use backend::{Backend, Call, MemoryBackend, TableDef, Tables};
pub use bind::{BindDescriptor, BindDirection, BindSet, BindState, BindType, ExecutionResult};
pub use config::ConnectionConfig;
pub use connection::Connection;
pub use error::{Error, Result};
pub use protocol::types::{OracleType, OracleValue};
