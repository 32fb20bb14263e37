//! In-process backend that plays the server side of the execute exchange.
//!
//! Statements are not parsed. Each statement text is registered with a Rust
//! handler that reads and assigns binds through a [`Call`] and works on the
//! [`Tables`] of the database.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;

use super::table::{TableDef, Tables};
use super::Backend;
use crate::bind::normalize_name;
use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::*;
use crate::protocol::decode::{
    decode_oracle_date, decode_oracle_number, encode_oracle_date, encode_oracle_number,
};
use crate::protocol::message::DataMessage;
use crate::protocol::messages::{ExecuteReply, ExecuteRequest};
use crate::protocol::types::{BindMetadata, OracleType, OracleValue};

/// Statement handler. Returns the number of rows affected.
pub type Handler = Arc<dyn Fn(&mut Tables, &mut Call) -> Result<u64> + Send + Sync>;

#[derive(Default)]
struct Database {
    tables: Tables,
    statements: HashMap<String, Handler>,
}

impl Database {
    fn execute(&mut self, request: ExecuteRequest) -> Result<ExecuteReply> {
        let key = normalize_sql(&request.sql);
        let Some(handler) = self.statements.get(&key).cloned() else {
            tracing::debug!(sql = %key, "statement not registered");
            return Ok(if request.is_plsql() {
                ExecuteReply::error(
                    TNS_ERR_PLSQL_COMPILATION,
                    "line 1, column 7:\nPLS-00201: identifier must be declared",
                )
            } else {
                ExecuteReply::error(TNS_ERR_TABLE_NOT_FOUND, "table or view does not exist")
            });
        };

        let mut call = Call::from_request(request)?;
        // Only tables the handler writes to are copied.
        let mut scratch = self.tables.clone();
        let outcome = handler(&mut scratch, &mut call)
            .and_then(|row_count| Ok((row_count, call.out_values()?)));

        match outcome {
            Ok((row_count, out_values)) => {
                self.tables = scratch;
                Ok(ExecuteReply::success(out_values, row_count))
            }
            Err(Error::Oracle { code, message }) => {
                tracing::debug!(code, %message, "statement failed");
                Ok(ExecuteReply::error(code, message))
            }
            Err(e) => Err(e),
        }
    }
}

/// Collapse runs of whitespace so registered text matches what clients send.
fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shared in-memory database.
///
/// Clones share the same tables and statements, so several connections
/// can execute against one database concurrently.
///
/// ```
/// use oracle_binds::{MemoryBackend, OracleType, TableDef};
///
/// # tokio_test::block_on(async {
/// let db = MemoryBackend::new();
/// db.create_table(TableDef::new("t").column("id", OracleType::Number))
///     .await
///     .unwrap();
/// db.insert("t", vec![1.into()]).await.unwrap();
/// assert_eq!(db.row_count("t").await.unwrap(), 1);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MemoryBackend {
    db: Arc<Mutex<Database>>,
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend").finish_non_exhaustive()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// `CREATE TABLE`. Fails with ORA-00955 if the name is taken.
    pub async fn create_table(&self, def: TableDef) -> Result<()> {
        tracing::debug!(table = def.name(), "create table");
        self.db.lock().await.tables.create(def)
    }

    /// `DROP TABLE`. Fails with ORA-00942 if the table does not exist.
    pub async fn drop_table(&self, name: &str) -> Result<()> {
        tracing::debug!(table = name, "drop table");
        self.db.lock().await.tables.remove(name)
    }

    /// Register the handler run for `sql`, replacing any previous one.
    pub async fn register<F>(&self, sql: &str, handler: F)
    where
        F: Fn(&mut Tables, &mut Call) -> Result<u64> + Send + Sync + 'static,
    {
        let key = normalize_sql(sql);
        tracing::debug!(sql = %key, "register statement");
        self.db.lock().await.statements.insert(key, Arc::new(handler));
    }

    /// Remove a registered statement. Fails with ORA-04043 if none exists.
    pub async fn unregister(&self, sql: &str) -> Result<()> {
        self.db
            .lock()
            .await
            .statements
            .remove(&normalize_sql(sql))
            .map(|_| ())
            .ok_or_else(|| Error::oracle(TNS_ERR_OBJECT_NOT_FOUND, "object does not exist"))
    }

    /// Insert a row directly, bypassing the wire.
    pub async fn insert(&self, table: &str, values: Vec<OracleValue>) -> Result<u64> {
        self.db.lock().await.tables.get_mut(table)?.insert(values)
    }

    /// Read one column of the row where `key_column = key`.
    pub async fn select_one(
        &self,
        table: &str,
        column: &str,
        key_column: &str,
        key: impl Into<OracleValue>,
    ) -> Result<OracleValue> {
        let key = key.into();
        self.db
            .lock()
            .await
            .tables
            .get(table)?
            .select_one(column, key_column, &key)
    }

    /// Row id of the row where `key_column = key`.
    pub async fn rowid(
        &self,
        table: &str,
        key_column: &str,
        key: impl Into<OracleValue>,
    ) -> Result<String> {
        let key = key.into();
        self.db.lock().await.tables.get(table)?.rowid(key_column, &key)
    }

    pub async fn row_count(&self, table: &str) -> Result<usize> {
        Ok(self.db.lock().await.tables.get(table)?.len())
    }
}

impl Backend for MemoryBackend {
    fn execute(&mut self, request: Bytes) -> impl Future<Output = Result<Bytes>> + Send {
        let db = self.db.clone();
        async move {
            let request = ExecuteRequest::parse(&mut ReadBuffer::new(request))?;
            tracing::trace!(
                seq = request.sequence_number,
                binds = request.binds.len(),
                "memory backend execute"
            );
            let reply = db.lock().await.execute(request)?;
            reply.to_data_bytes()
        }
    }
}

struct CallBind {
    metadata: BindMetadata,
    value: OracleValue,
}

/// The binds of one execution as seen by a statement handler.
///
/// IN and IN/OUT binds start with the value the client sent; OUT binds
/// start NULL. Whatever OUT and IN/OUT binds hold when the handler returns
/// is sent back.
pub struct Call {
    sql: String,
    binds: Vec<CallBind>,
}

impl Call {
    fn from_request(request: ExecuteRequest) -> Result<Self> {
        let binds = request
            .binds
            .into_iter()
            .zip(request.values)
            .map(|(metadata, wire)| -> Result<CallBind> {
                let value = if metadata.is_input() {
                    decode_input(&metadata, wire)?
                } else {
                    OracleValue::Null
                };
                Ok(CallBind { metadata, value })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            sql: request.sql,
            binds,
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn find(&self, name: &str) -> Result<usize> {
        let name = normalize_name(name);
        self.binds
            .iter()
            .position(|b| b.metadata.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                Error::oracle(TNS_ERR_NOT_ALL_VARIABLES_BOUND, "not all variables bound")
            })
    }

    /// Current value of a bind. Fails with ORA-01008 for unknown names.
    pub fn get(&self, name: &str) -> Result<OracleValue> {
        let index = self.find(name)?;
        Ok(self.binds[index].value.clone())
    }

    /// Assign an OUT or IN/OUT bind.
    ///
    /// Assigning an IN bind fails with ORA-06550.
    pub fn set(&mut self, name: &str, value: impl Into<OracleValue>) -> Result<()> {
        let index = self.find(name)?;
        let bind = &mut self.binds[index];
        if !bind.metadata.is_output() {
            return Err(Error::oracle(
                TNS_ERR_PLSQL_COMPILATION,
                format!(
                    "PLS-00363: expression '{}' cannot be used as an assignment target",
                    bind.metadata.name.to_ascii_uppercase()
                ),
            ));
        }
        bind.value = value.into();
        Ok(())
    }

    fn out_values(&self) -> Result<Vec<(u16, Option<Bytes>)>> {
        self.binds
            .iter()
            .enumerate()
            .filter(|(_, b)| b.metadata.is_output())
            .map(|(pos, b)| -> Result<(u16, Option<Bytes>)> {
                Ok((pos as u16, encode_output(&b.metadata, &b.value)?))
            })
            .collect()
    }
}

fn decode_input(metadata: &BindMetadata, wire: Option<Bytes>) -> Result<OracleValue> {
    let Some(bytes) = wire else {
        return Ok(OracleValue::Null);
    };
    let value = match metadata.oracle_type()? {
        OracleType::Number => OracleValue::Number(decode_oracle_number(&bytes)?),
        OracleType::Date => OracleValue::Date(decode_oracle_date(&bytes)?),
        t if t.is_binary() => OracleValue::Raw(bytes.to_vec()),
        _ => OracleValue::String(String::from_utf8(bytes.to_vec()).map_err(|e| {
            Error::type_conversion(format!("bind :{} sent invalid UTF-8: {}", metadata.name, e))
        })?),
    };
    Ok(value)
}

fn numeric_or_value(detail: &str) -> Error {
    Error::oracle(
        TNS_ERR_NUMERIC_OR_VALUE,
        format!("PL/SQL: numeric or value error: {}", detail),
    )
}

/// Convert an assigned value to the declared bind type.
///
/// The result must fit the buffer the client reserved.
fn encode_output(metadata: &BindMetadata, value: &OracleValue) -> Result<Option<Bytes>> {
    let ora_type = metadata.oracle_type()?;
    let bytes = match (ora_type, value) {
        (_, OracleValue::Null) => return Ok(None),
        (_, OracleValue::String(s)) if s.is_empty() => return Ok(None),
        (OracleType::Number, OracleValue::Number(s) | OracleValue::String(s)) => {
            encode_oracle_number(s.trim())
                .map_err(|_| numeric_or_value("character to number conversion error"))?
        }
        (OracleType::Date, OracleValue::Date(dt)) => encode_oracle_date(dt)?.to_vec(),
        (t, OracleValue::Raw(raw)) if t.is_binary() => raw.clone(),
        (t, OracleValue::String(s) | OracleValue::Number(s)) if t.is_text() => {
            s.as_bytes().to_vec()
        }
        (t, OracleValue::Date(dt)) if t.is_text() => {
            dt.format("%Y-%m-%d %H:%M:%S").to_string().into_bytes()
        }
        (t, OracleValue::Raw(raw)) if t.is_text() => raw
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<String>()
            .into_bytes(),
        (t, v) => {
            return Err(numeric_or_value(&format!(
                "cannot convert {} to {}",
                v.kind(),
                t
            )))
        }
    };
    if bytes.is_empty() {
        return Ok(None);
    }
    if bytes.len() > metadata.buffer_size as usize {
        return Err(numeric_or_value("character string buffer too small"));
    }
    Ok(Some(Bytes::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::ExecuteMessage;
    use crate::protocol::response::parse_execute_response;

    const PROC: &str = "BEGIN get_content(:i, :c); END;";

    fn binds(c_type: OracleType, c_size: u32) -> Vec<BindMetadata> {
        vec![
            BindMetadata::new("i", TNS_BIND_DIR_INPUT, OracleType::Number, 22),
            BindMetadata::new("c", TNS_BIND_DIR_OUTPUT, c_type, c_size),
        ]
    }

    async fn send(
        db: &mut MemoryBackend,
        sql: &str,
        binds: &[BindMetadata],
        values: &[Option<Bytes>],
    ) -> crate::protocol::response::ExecuteResponse {
        let request = ExecuteMessage::new(sql, 1, binds, values)
            .to_data_bytes()
            .unwrap();
        let reply = db.execute(request).await.unwrap();
        let mut buf = ReadBuffer::new(reply);
        buf.read_u16_be().unwrap();
        parse_execute_response(&mut buf).unwrap()
    }

    async fn setup() -> MemoryBackend {
        let db = MemoryBackend::new();
        db.create_table(
            TableDef::new("t")
                .column("id", OracleType::Number)
                .column("content", OracleType::Long),
        )
        .await
        .unwrap();
        db.insert("t", vec![1.into(), "x".repeat(20).into()])
            .await
            .unwrap();
        db.register(PROC, |tables, call| {
            let id = call.get("i")?;
            let content = tables.get("t")?.select_one("content", "id", &id)?;
            call.set("c", content)?;
            Ok(0)
        })
        .await;
        db
    }

    #[tokio::test]
    async fn test_out_value_returned() {
        let mut db = setup().await;
        let binds = binds(OracleType::Varchar2 { max_size: 100 }, 100);
        let values = vec![Some(Bytes::from_static(&[0xC1, 0x02])), None];
        let response = send(&mut db, "BEGIN  get_content(:i,   :c); END;", &binds, &values).await;
        assert_eq!(response.error_info.error_num, 0);
        assert_eq!(response.out_values.len(), 1);
        assert_eq!(response.out_values[0].0, 1);
        assert_eq!(response.out_values[0].1.as_deref(), Some(&b"x".repeat(20)[..]));
    }

    #[tokio::test]
    async fn test_buffer_too_small_on_server() {
        let mut db = setup().await;
        let binds = binds(OracleType::Varchar2 { max_size: 10 }, 10);
        let values = vec![Some(Bytes::from_static(&[0xC1, 0x02])), None];
        let response = send(&mut db, PROC, &binds, &values).await;
        assert_eq!(response.error_info.error_num, TNS_ERR_NUMERIC_OR_VALUE);
        assert!(response
            .error_info
            .message
            .unwrap()
            .contains("character string buffer too small"));
        assert!(response.out_values.is_empty());
    }

    #[tokio::test]
    async fn test_no_data_found() {
        let mut db = setup().await;
        let binds = binds(OracleType::Long, 1 << 20);
        let values = vec![Some(Bytes::from_static(&[0xC1, 0x03])), None];
        let response = send(&mut db, PROC, &binds, &values).await;
        assert_eq!(response.error_info.error_num, TNS_ERR_NO_DATA_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_statements() {
        let mut db = MemoryBackend::new();
        let response = send(&mut db, "BEGIN missing_proc; END;", &[], &[]).await;
        assert_eq!(response.error_info.error_num, TNS_ERR_PLSQL_COMPILATION);
        let response = send(&mut db, "SELECT * FROM missing", &[], &[]).await;
        assert_eq!(response.error_info.error_num, TNS_ERR_TABLE_NOT_FOUND);
        assert_eq!(
            db.unregister("SELECT 1").await.unwrap_err().oracle_code(),
            Some(TNS_ERR_OBJECT_NOT_FOUND)
        );
    }

    #[tokio::test]
    async fn test_failed_statement_rolls_back() {
        let mut db = setup().await;
        let sql = "BEGIN insert_twice(:i); END;";
        db.register(sql, |tables, call| {
            let id = call.get("i")?;
            let table = tables.get_mut("t")?;
            table.insert(vec![id.clone(), "a".into()])?;
            table.insert(vec![id, "b".into()])?;
            call.set("i", 0)?;
            Ok(2)
        })
        .await;
        let binds = vec![BindMetadata::new("i", TNS_BIND_DIR_INPUT, OracleType::Number, 22)];
        let values = vec![Some(Bytes::from_static(&[0xC1, 0x06]))];
        let response = send(&mut db, sql, &binds, &values).await;
        assert_eq!(response.error_info.error_num, TNS_ERR_PLSQL_COMPILATION);
        assert_eq!(db.row_count("t").await.unwrap(), 1);
    }

    #[test]
    fn test_encode_output_conversions() {
        let text = BindMetadata::new("c", TNS_BIND_DIR_OUTPUT, OracleType::Varchar2 { max_size: 10 }, 10);
        let number = BindMetadata::new("n", TNS_BIND_DIR_OUTPUT, OracleType::Number, 22);

        let out = encode_output(&text, &OracleValue::from(12.5)).unwrap();
        assert_eq!(out.as_deref(), Some(&b"12.5"[..]));
        let out = encode_output(&text, &OracleValue::Raw(vec![0xAB, 0x01])).unwrap();
        assert_eq!(out.as_deref(), Some(&b"AB01"[..]));
        assert_eq!(encode_output(&text, &OracleValue::from("")).unwrap(), None);

        let out = encode_output(&number, &OracleValue::from(" 100 ")).unwrap();
        assert_eq!(out.as_deref(), Some(&[0xC2, 0x02][..]));
        let err = encode_output(&number, &OracleValue::from("abc")).unwrap_err();
        assert_eq!(err.oracle_code(), Some(TNS_ERR_NUMERIC_OR_VALUE));
    }

    #[test]
    fn test_call_get_unknown_bind() {
        let mut call = Call {
            sql: PROC.to_string(),
            binds: vec![],
        };
        assert_eq!(call.get("x").unwrap_err().oracle_code(), Some(TNS_ERR_NOT_ALL_VARIABLES_BOUND));
        assert_eq!(call.set(":x", 1).unwrap_err().oracle_code(), Some(TNS_ERR_NOT_ALL_VARIABLES_BOUND));
        assert_eq!(call.sql(), PROC);
    }
}
