//! Typed in-memory tables for the memory backend.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use crate::protocol::decode::{decode_oracle_number, encode_oracle_date, encode_oracle_number};
use crate::protocol::types::{OracleType, OracleValue};

/// Digits of a physical ROWID.
const ROWID_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// First data object number handed out.
const FIRST_OBJECT_ID: u32 = 73_000;

/// Rows per simulated data block.
const ROWS_PER_BLOCK: u32 = 256;

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: OracleType,
}

/// Table definition passed to `create_table`.
///
/// ```
/// use oracle_binds::backend::TableDef;
/// use oracle_binds::OracleType;
///
/// let def = TableDef::new("nodb_urowid_indexed")
///     .column("c1", OracleType::Number)
///     .column("c2", OracleType::Varchar2 { max_size: 3125 })
///     .primary_key(&["c1", "c2"]);
/// assert_eq!(def.name(), "nodb_urowid_indexed");
/// ```
#[derive(Debug, Clone)]
pub struct TableDef {
    name: String,
    columns: Vec<Column>,
    primary_key: Vec<String>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, data_type: OracleType) -> Self {
        self.columns.push(Column {
            name: name.into(),
            data_type,
        });
        self
    }

    /// Make the table index-organized on `columns`.
    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
struct StoredRow {
    slot: u32,
    values: Vec<OracleValue>,
}

/// A table: typed columns, rows in insertion order and an optional
/// primary key.
///
/// Tables with a primary key are index-organized and hand out logical
/// UROWIDs; heap tables hand out 18 character physical ROWIDs.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    object_id: u32,
    columns: Vec<Column>,
    primary_key: Vec<usize>,
    rows: Vec<StoredRow>,
    next_slot: u32,
}

impl Table {
    fn from_def(def: TableDef, object_id: u32) -> Result<Self> {
        let mut table = Self {
            name: def.name.to_ascii_uppercase(),
            object_id,
            columns: Vec::with_capacity(def.columns.len()),
            primary_key: Vec::with_capacity(def.primary_key.len()),
            rows: Vec::new(),
            next_slot: 0,
        };
        for column in def.columns {
            if table.column_index(&column.name).is_ok() {
                return Err(Error::oracle(TNS_ERR_DUPLICATE_COLUMN, "duplicate column name"));
            }
            table.columns.push(column);
        }
        for key in &def.primary_key {
            let index = table.column_index(key)?;
            if matches!(table.columns[index].data_type, OracleType::Long | OracleType::LongRaw) {
                return Err(Error::oracle(
                    TNS_ERR_LONG_KEY,
                    "column of datatype LONG cannot be unique or a primary key",
                ));
            }
            table.primary_key.push(index);
        }
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether rows are addressed by primary key.
    pub fn is_index_organized(&self) -> bool {
        !self.primary_key.is_empty()
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                Error::oracle(
                    TNS_ERR_INVALID_IDENTIFIER,
                    format!("\"{}\": invalid identifier", name.to_ascii_uppercase()),
                )
            })
    }

    /// Insert one row, values in column order. Returns rows affected.
    pub fn insert(&mut self, values: Vec<OracleValue>) -> Result<u64> {
        if values.len() < self.columns.len() {
            return Err(Error::oracle(TNS_ERR_NOT_ENOUGH_VALUES, "not enough values"));
        }
        if values.len() > self.columns.len() {
            return Err(Error::oracle(TNS_ERR_TOO_MANY_VALUES, "too many values"));
        }
        let values = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| self.coerce(index, value))
            .collect::<Result<Vec<_>>>()?;

        if self.is_index_organized() {
            if let Some(&index) = self.primary_key.iter().find(|&&i| values[i].is_null()) {
                return Err(Error::oracle(
                    TNS_ERR_CANNOT_INSERT_NULL,
                    format!(
                        "cannot insert NULL into (\"{}\".\"{}\")",
                        self.name,
                        self.columns[index].name.to_ascii_uppercase()
                    ),
                ));
            }
            self.encode_key(&values)?;
            let duplicate = self.rows.iter().any(|row| {
                self.primary_key
                    .iter()
                    .all(|&i| values_match(&row.values[i], &values[i]))
            });
            if duplicate {
                return Err(Error::oracle(
                    TNS_ERR_UNIQUE_CONSTRAINT,
                    format!("unique constraint ({}_PK) violated", self.name),
                ));
            }
        }

        let slot = self.next_slot;
        self.next_slot += 1;
        self.rows.push(StoredRow { slot, values });
        Ok(1)
    }

    /// `SELECT column INTO ... FROM table WHERE key_column = key`.
    pub fn select_one(&self, column: &str, key_column: &str, key: &OracleValue) -> Result<OracleValue> {
        let index = self.column_index(column)?;
        let row = self.find_row(key_column, key)?;
        Ok(row.values[index].clone())
    }

    /// `UPDATE table SET column = value WHERE key_column = key`.
    ///
    /// Returns the number of rows updated.
    pub fn update(
        &mut self,
        column: &str,
        value: OracleValue,
        key_column: &str,
        key: &OracleValue,
    ) -> Result<u64> {
        let index = self.column_index(column)?;
        let key_index = self.column_index(key_column)?;
        let value = self.coerce(index, value)?;
        let mut updated = 0;
        for row in &mut self.rows {
            if values_match(&row.values[key_index], key) {
                row.values[index] = value.clone();
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// `SELECT ROWID FROM table WHERE key_column = key`.
    pub fn rowid(&self, key_column: &str, key: &OracleValue) -> Result<String> {
        let row = self.find_row(key_column, key)?;
        if self.is_index_organized() {
            self.logical_rowid(row)
        } else {
            Ok(self.physical_rowid(row.slot))
        }
    }

    fn find_row(&self, key_column: &str, key: &OracleValue) -> Result<&StoredRow> {
        let key_index = self.column_index(key_column)?;
        self.rows
            .iter()
            .find(|row| values_match(&row.values[key_index], key))
            .ok_or_else(|| Error::oracle(TNS_ERR_NO_DATA_FOUND, "no data found"))
    }

    /// Convert a value to the column type and check its length.
    fn coerce(&self, index: usize, value: OracleValue) -> Result<OracleValue> {
        let column = &self.columns[index];
        let data_type = column.data_type;
        let value = match (data_type, value) {
            (_, OracleValue::Null) => return Ok(OracleValue::Null),
            (_, OracleValue::String(s)) if s.is_empty() => return Ok(OracleValue::Null),
            (OracleType::Number, OracleValue::Number(s) | OracleValue::String(s)) => {
                let canonical = encode_oracle_number(&s)
                    .and_then(|bytes| decode_oracle_number(&bytes))
                    .map_err(|_| Error::oracle(TNS_ERR_INVALID_NUMBER, "invalid number"))?;
                OracleValue::Number(canonical)
            }
            (t, OracleValue::String(s) | OracleValue::Number(s)) if t.is_text() => {
                OracleValue::String(s)
            }
            (t, OracleValue::Raw(raw)) if t.is_binary() => OracleValue::Raw(raw),
            (OracleType::Date, OracleValue::Date(dt)) => OracleValue::Date(dt),
            (t, v) => {
                return Err(Error::oracle(
                    TNS_ERR_INCONSISTENT_DATATYPES,
                    format!("inconsistent datatypes: expected {} got {}", t, v.kind()),
                ))
            }
        };

        let len = match &value {
            OracleValue::String(s) => s.len(),
            OracleValue::Raw(raw) => raw.len(),
            _ => return Ok(value),
        };
        // '' is NULL
        if len == 0 {
            return Ok(OracleValue::Null);
        }
        if let Some(max) = data_type.max_size() {
            if len > max as usize {
                return Err(Error::oracle(
                    TNS_ERR_VALUE_TOO_LARGE,
                    format!(
                        "value too large for column \"{}\".\"{}\" (actual: {}, maximum: {})",
                        self.name,
                        column.name.to_ascii_uppercase(),
                        len,
                        max
                    ),
                ));
            }
        }
        Ok(value)
    }

    /// OOOOOOFFFBBBBBBRRR: object, relative file, block, row.
    fn physical_rowid(&self, slot: u32) -> String {
        let mut rowid = String::with_capacity(18);
        push_rowid_digits(&mut rowid, self.object_id, 6);
        push_rowid_digits(&mut rowid, 1, 3);
        push_rowid_digits(&mut rowid, 128 + slot / ROWS_PER_BLOCK, 6);
        push_rowid_digits(&mut rowid, slot % ROWS_PER_BLOCK, 3);
        rowid
    }

    /// `*` followed by base64 of the object number and primary key values.
    fn logical_rowid(&self, row: &StoredRow) -> Result<String> {
        let key = self.encode_key(&row.values)?;
        Ok(format!("*{}", STANDARD_NO_PAD.encode(key)))
    }

    /// Object number, then each key column as a u16 length and its bytes.
    fn encode_key(&self, values: &[OracleValue]) -> Result<Vec<u8>> {
        let mut key = vec![0x02];
        key.extend_from_slice(&self.object_id.to_be_bytes());
        for &index in &self.primary_key {
            let bytes = match &values[index] {
                OracleValue::Null => Vec::new(),
                OracleValue::String(s) => s.as_bytes().to_vec(),
                OracleValue::Number(s) => encode_oracle_number(s)?,
                OracleValue::Date(dt) => encode_oracle_date(dt)?.to_vec(),
                OracleValue::Raw(raw) => raw.clone(),
            };
            let len = u16::try_from(bytes.len()).map_err(|_| {
                Error::oracle(
                    TNS_ERR_KEY_TOO_LONG,
                    format!("maximum key length ({}) exceeded", u16::MAX),
                )
            })?;
            key.extend_from_slice(&len.to_be_bytes());
            key.extend_from_slice(&bytes);
        }
        Ok(key)
    }
}

fn push_rowid_digits(out: &mut String, value: u32, width: u32) {
    for i in (0..width).rev() {
        let digit = (value >> (6 * i)) & 0x3F;
        out.push(ROWID_ALPHABET[digit as usize] as char);
    }
}

/// SQL equality: NULL matches nothing, numbers compare by value.
fn values_match(a: &OracleValue, b: &OracleValue) -> bool {
    match (a, b) {
        (OracleValue::Null, _) | (_, OracleValue::Null) => false,
        (OracleValue::Number(x), OracleValue::Number(y) | OracleValue::String(y))
        | (OracleValue::String(x), OracleValue::Number(y)) => {
            match (encode_oracle_number(x), encode_oracle_number(y)) {
                (Ok(x), Ok(y)) => x == y,
                _ => false,
            }
        }
        _ => a == b,
    }
}

/// All tables of a memory database, keyed by upper-case name.
///
/// Cloning shares every table; a table is copied only when it is first
/// borrowed mutably through the clone.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    tables: HashMap<String, Arc<Table>>,
    created: u32,
}

impl Tables {
    /// `CREATE TABLE`.
    pub fn create(&mut self, def: TableDef) -> Result<()> {
        let key = def.name.to_ascii_uppercase();
        if self.tables.contains_key(&key) {
            return Err(Error::oracle(
                TNS_ERR_NAME_ALREADY_USED,
                "name is already used by an existing object",
            ));
        }
        let table = Table::from_def(def, FIRST_OBJECT_ID + self.created)?;
        self.created += 1;
        self.tables.insert(key, Arc::new(table));
        Ok(())
    }

    /// `DROP TABLE`.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.tables
            .remove(&name.to_ascii_uppercase())
            .map(|_| ())
            .ok_or_else(table_not_found)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_ascii_uppercase())
    }

    pub fn get(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(&name.to_ascii_uppercase())
            .map(|table| table.as_ref())
            .ok_or_else(table_not_found)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(&name.to_ascii_uppercase())
            .map(Arc::make_mut)
            .ok_or_else(table_not_found)
    }
}

fn table_not_found() -> Error {
    Error::oracle(TNS_ERR_TABLE_NOT_FOUND, "table or view does not exist")
}
