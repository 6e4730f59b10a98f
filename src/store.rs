// used for the round trips to the relational store
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ErrorCode, ToSql, params_from_iter};
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

use crate::error::{Result, StaylensError};
use crate::facet::QuerySpec;

/// How many times a busy or locked store is retried before giving up.
pub const RETRY_ATTEMPTS: u32 = 3;
/// Fixed delay between retries.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

// ------------- Value -------------
/// A single cell pulled from the store.
///
/// The aggregation core treats rows as opaque column-to-value mappings, so the
/// SQLite type system is narrowed to the four shapes the dashboard consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Real(r) => Some(r.round() as i64),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
            // the dataset carries no blob columns
            ValueRef::Blob(_) => Value::Null,
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*r)),
            Value::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
        })
    }
}

// ------------- RawRow -------------
/// One record from a query result, keeping the column order of the statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push(column.into());
        self.values.push(value);
    }
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

// ------------- Store -------------
/// Synchronous access to the SQLite database behind the dashboard.
///
/// Only this collaborator retries: a bounded reconnect-and-retry loop for
/// transient busy/locked conditions. Deterministic failures from the composer
/// and aggregator are never retried, since re-running a pure function on the
/// same input cannot change the outcome.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open(path)?),
        })
    }
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    /// Runs several statements at once, mainly to seed test databases.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Executes a parameterized statement and materializes every row.
    /// Values reach the statement exclusively through positional binding.
    pub fn select(&self, sql: &str, params: &[Value]) -> Result<Vec<RawRow>> {
        let mut attempt = 1;
        loop {
            let outcome = {
                let conn = self.lock()?;
                run_select(&conn, sql, params)
            };
            match outcome {
                Ok(rows) => return Ok(rows),
                Err(e) if transient(&e) && attempt < RETRY_ATTEMPTS => {
                    warn!(error = %e, attempt, "data store busy, retrying");
                    attempt += 1;
                    std::thread::sleep(RETRY_DELAY);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Executes a composed query spec.
    pub fn select_spec(&self, spec: &QuerySpec) -> Result<Vec<RawRow>> {
        self.select(spec.sql(), spec.params())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StaylensError::DataStore(format!("connection lock poisoned: {e}")))
    }
}

fn run_select(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<Vec<RawRow>> {
    let mut statement = conn.prepare(sql)?;
    let columns: Vec<String> = statement
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let mut rows = statement.query(params_from_iter(params.iter()))?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut raw = RawRow::new();
        for (i, column) in columns.iter().enumerate() {
            raw.push(column.clone(), Value::from(row.get_ref(i)?));
        }
        result.push(raw);
    }
    Ok(result)
}

fn transient(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
    )
}
