//! Shared fixtures for the integration suites.
//!
//! Each fixture creates its tables and registers its statements on a fresh
//! [`MemoryBackend`], the way a real suite would run DDL before its tests.

#![allow(dead_code)]

use oracle_binds::{
    BindDescriptor, BindSet, BindType, Connection, ConnectionConfig, ExecutionResult,
    MemoryBackend, OracleType, OracleValue, TableDef,
};
use rand::distributions::Alphanumeric;
use rand::Rng;

pub const LONG_TABLE: &str = "nodb_long_130";
pub const LONG_INSERT: &str = "insert into nodb_long_130 values (:i, :c)";
pub const LONG_OUT_PROC: &str = "BEGIN nodb_long_bindout_proc_1 (:i, :c); END;";
pub const VARCHAR2_OUT_PROC: &str = "BEGIN nodb_long_bindout_proc_2 (:i, :c); END;";

pub const UROWID_INDEXED_TABLE: &str = "nodb_urowid_indexed_proc";
pub const UROWID_NORMAL_TABLE: &str = "nodb_urowid_normal_proc";
pub const UROWID_INDEXED_INSERT: &str = "insert into nodb_urowid_indexed_proc values (:i, :s)";
pub const UROWID_SELECT_ROWID: &str =
    "BEGIN SELECT ROWID INTO :r FROM nodb_urowid_indexed_proc WHERE c1 = :i; END;";
pub const UROWID_INOUT_PROC: &str = "BEGIN nodb_rowid_bind_inout_1461 (:i, :c); END;";
pub const VARCHAR2_INOUT_PROC: &str = "BEGIN nodb_rowid_bind_inout_1462 (:i, :c); END;";
pub const UROWID_UPDATE_PROC: &str = "BEGIN nodb_rowid_bind_inout_1463 (:i, :c1, :c2); END;";

/// Largest value a PL/SQL VARCHAR2 variable holds.
const PLSQL_VARCHAR2_MAX: usize = 32767;

/// Random alphanumeric string of `len` characters.
pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// A database, a connection to it, and the id the next test row gets.
pub struct TestContext {
    pub db: MemoryBackend,
    pub conn: Connection<MemoryBackend>,
    insert_id: i64,
}

impl TestContext {
    fn new(db: MemoryBackend) -> Self {
        dotenvy::dotenv().ok();
        let config = ConnectionConfig::from_env().unwrap_or_default();
        Self {
            conn: Connection::with_config(db.clone(), config),
            db,
            insert_id: 0,
        }
    }

    /// Advance to a fresh row id and return it.
    pub fn next_id(&mut self) -> i64 {
        self.insert_id += 1;
        self.insert_id
    }

    /// Skip ids, for tests that use more than one row.
    pub fn skip_ids(&mut self, count: i64) {
        self.insert_id += count;
    }

    pub async fn execute(&mut self, sql: &str, binds: BindSet) -> oracle_binds::Result<ExecutionResult> {
        self.conn.execute(sql, binds).await
    }

    /// `nodb_long_130(id NUMBER, content LONG)` and its OUT procedures.
    ///
    /// `nodb_long_bindout_proc_1` returns the content as LONG,
    /// `nodb_long_bindout_proc_2` as VARCHAR2.
    pub async fn long() -> Self {
        let db = MemoryBackend::new();
        db.create_table(
            TableDef::new(LONG_TABLE)
                .column("id", OracleType::Number)
                .column("content", OracleType::Long),
        )
        .await
        .unwrap();

        db.register(LONG_INSERT, |tables, call| {
            let row = vec![call.get("i")?, call.get("c")?];
            tables.get_mut(LONG_TABLE)?.insert(row)
        })
        .await;

        db.register(LONG_OUT_PROC, |tables, call| {
            let num = call.get("i")?;
            let content = tables.get(LONG_TABLE)?.select_one("content", "id", &num)?;
            call.set("c", content)?;
            Ok(0)
        })
        .await;

        db.register(VARCHAR2_OUT_PROC, |tables, call| {
            let num = call.get("i")?;
            let content = tables.get(LONG_TABLE)?.select_one("content", "id", &num)?;
            if content.as_str().map_or(0, str::len) > PLSQL_VARCHAR2_MAX {
                return Err(oracle_binds::Error::oracle(
                    6502,
                    "PL/SQL: numeric or value error: character string buffer too small",
                ));
            }
            call.set("c", content)?;
            Ok(0)
        })
        .await;

        Self::new(db)
    }

    /// Insert `content` into the LONG table under a fresh id.
    pub async fn insert_long(&mut self, content: impl Into<OracleValue>) -> i64 {
        let id = self.next_id();
        let binds = BindSet::new()
            .bind("i", BindDescriptor::typed_input(BindType::Number, id))
            .bind("c", BindDescriptor::typed_input(BindType::String, content));
        let result = self.execute(LONG_INSERT, binds).await.unwrap();
        assert_eq!(result.rows_affected, 1);
        id
    }

    /// The index-organized and heap UROWID tables and their procedures.
    pub async fn urowid() -> Self {
        let db = MemoryBackend::new();
        db.create_table(
            TableDef::new(UROWID_INDEXED_TABLE)
                .column("c1", OracleType::Number)
                .column("c2", OracleType::Varchar2 { max_size: 3125 })
                .primary_key(&["c1", "c2"]),
        )
        .await
        .unwrap();
        db.create_table(
            TableDef::new(UROWID_NORMAL_TABLE)
                .column("id", OracleType::Number)
                .column("content", OracleType::Urowid { max_size: 4000 }),
        )
        .await
        .unwrap();

        db.register(UROWID_INDEXED_INSERT, |tables, call| {
            let row = vec![call.get("i")?, call.get("s")?];
            tables.get_mut(UROWID_INDEXED_TABLE)?.insert(row)
        })
        .await;

        db.register(UROWID_SELECT_ROWID, |tables, call| {
            let id = call.get("i")?;
            let rowid = tables.get(UROWID_INDEXED_TABLE)?.rowid("c1", &id)?;
            call.set("r", rowid)?;
            Ok(0)
        })
        .await;

        // Both procedures insert the row id and read it back; one declares
        // the parameter UROWID, the other VARCHAR2.
        for proc in [UROWID_INOUT_PROC, VARCHAR2_INOUT_PROC] {
            db.register(proc, |tables, call| {
                let id = call.get("i")?;
                let table = tables.get_mut(UROWID_NORMAL_TABLE)?;
                table.insert(vec![id.clone(), call.get("c")?])?;
                let content = table.select_one("content", "id", &id)?;
                call.set("c", content)?;
                Ok(0)
            })
            .await;
        }

        db.register(UROWID_UPDATE_PROC, |tables, call| {
            let id = call.get("i")?;
            let table = tables.get_mut(UROWID_NORMAL_TABLE)?;
            table.insert(vec![id.clone(), call.get("c1")?])?;
            table.update("content", call.get("c2")?, "id", &id)?;
            let content = table.select_one("content", "id", &id)?;
            call.set("c1", content.clone())?;
            call.set("c2", content)?;
            Ok(0)
        })
        .await;

        Self::new(db)
    }

    /// Insert a key of `len` random characters into the index-organized
    /// table under `id` and return the row's UROWID.
    pub async fn indexed_rowid(&mut self, id: i64, len: usize) -> String {
        let binds = BindSet::new()
            .bind("i", BindDescriptor::typed_input(BindType::Number, id))
            .bind("s", BindDescriptor::input(random_string(len)));
        let result = self.execute(UROWID_INDEXED_INSERT, binds).await.unwrap();
        assert_eq!(result.rows_affected, 1);

        let binds = BindSet::new()
            .bind("r", BindDescriptor::output(BindType::String, Some(5000)))
            .bind("i", BindDescriptor::input(id));
        let result = self.execute(UROWID_SELECT_ROWID, binds).await.unwrap();
        result
            .out_str("r")
            .expect("row id returned")
            .to_string()
    }
}
