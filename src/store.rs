//! Store boundary and materializer
//!
//! The pipeline touches the external store through exactly two operations:
//! run a read query and get back a fully materialized table, or replace a
//! named destination table with new schema and rows. `SqliteStore` is the
//! reference implementation backed by rusqlite.
//!
//! Replace-table runs drop, create and bulk insert inside a single
//! transaction: a failed run rolls back and leaves the previous table
//! intact, so there is never a window with no destination table. The
//! connection sits behind a mutex, which serializes concurrent runs
//! against the same destination for the whole drop-create-load sequence.

use crate::config::EtlConfig;
use crate::error::EtlError;
use crate::schema::DestinationSchema;
use crate::table::{Column, TabularResult, Value};
use log::info;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, InterruptHandle, ToSql};
use rust_decimal::Decimal;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Narrow interface to the relational store.
pub trait SummaryStore {
    /// Run a read-only query, returning the whole result.
    fn execute_read(&self, sql: &str) -> Result<TabularResult, EtlError>;

    /// Atomically drop, recreate and load the destination table. The row
    /// columns may be a superset of the schema's, in any order; binding is
    /// by schema column name. Returns the number of rows inserted.
    fn replace_table(
        &self,
        schema: &DestinationSchema,
        rows: &TabularResult,
    ) -> Result<usize, EtlError>;
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    statement_deadline: Duration,
}

impl SqliteStore {
    /// Open a store at the configured path. Sets the busy timeout so a
    /// locked database waits instead of failing immediately.
    pub fn open(config: &EtlConfig) -> Result<Self, EtlError> {
        let conn = Connection::open(&config.db_path)
            .map_err(|e| EtlError::Storage(format!("cannot open '{}': {}", config.db_path, e)))?;
        Self::with_connection(conn, config)
    }

    /// In-memory store, used by tests and dry runs.
    pub fn open_in_memory(config: &EtlConfig) -> Result<Self, EtlError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| EtlError::Storage(e.to_string()))?;
        Self::with_connection(conn, config)
    }

    fn with_connection(conn: Connection, config: &EtlConfig) -> Result<Self, EtlError> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| EtlError::Storage(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            statement_deadline: Duration::from_millis(config.statement_deadline_ms),
        })
    }

    /// Execute a batch of statements outside the pipeline, e.g. to load
    /// source fixtures or run schema setup scripts.
    pub fn execute_batch(&self, sql: &str) -> Result<(), EtlError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(sql)
            .map_err(|e| EtlError::Storage(e.to_string()))
    }
}

impl SummaryStore for SqliteStore {
    fn execute_read(&self, sql: &str) -> Result<TabularResult, EtlError> {
        let conn = self.conn.lock().unwrap();
        let _deadline = DeadlineGuard::arm(&conn, self.statement_deadline);

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| EtlError::Query(e.to_string()))?;
        let names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::new()))
            .collect();

        let mut rows = stmt.query([]).map_err(|e| EtlError::Query(e.to_string()))?;
        let mut row_count = 0usize;
        while let Some(row) = rows.next().map_err(|e| EtlError::Query(e.to_string()))? {
            for (i, column) in columns.iter_mut().enumerate() {
                let cell = row
                    .get_ref(i)
                    .map_err(|e| EtlError::Query(e.to_string()))?;
                column.values.push(value_from_sql(cell)?);
            }
            row_count += 1;
        }
        drop(rows);
        drop(stmt);

        info!("📥 Read query returned {} rows", row_count);
        TabularResult::new(columns).map_err(|e| EtlError::Query(e.to_string()))
    }

    fn replace_table(
        &self,
        schema: &DestinationSchema,
        rows: &TabularResult,
    ) -> Result<usize, EtlError> {
        // Bind by schema column name; fail before touching the store if
        // any schema column is missing from the rows.
        let indices: Vec<usize> = schema
            .columns
            .iter()
            .map(|col| {
                rows.columns()
                    .iter()
                    .position(|c| c.name == col.name)
                    .ok_or_else(|| {
                        EtlError::Storage(format!(
                            "rows are missing schema column '{}'",
                            col.name
                        ))
                    })
            })
            .collect::<Result<_, _>>()?;

        // Hold the lock across the whole drop-create-load so concurrent
        // runs against the same destination serialize.
        let mut conn = self.conn.lock().unwrap();
        let _deadline = DeadlineGuard::arm(&conn, self.statement_deadline);

        let tx = conn
            .transaction()
            .map_err(|e| EtlError::Storage(e.to_string()))?;
        tx.execute_batch(&schema.drop_sql())
            .map_err(|e| EtlError::Storage(format!("drop failed: {}", e)))?;
        tx.execute_batch(&schema.create_sql())
            .map_err(|e| EtlError::Storage(format!("create failed: {}", e)))?;

        let mut inserted = 0usize;
        {
            let mut stmt = tx
                .prepare(&schema.insert_sql())
                .map_err(|e| EtlError::Storage(e.to_string()))?;
            for row in 0..rows.row_count() {
                let params = indices
                    .iter()
                    .map(|&i| &rows.columns()[i].values[row]);
                stmt.execute(rusqlite::params_from_iter(params))
                    .map_err(|e| EtlError::Storage(format!("insert row {} failed: {}", row, e)))?;
                inserted += 1;
            }
        }
        tx.commit()
            .map_err(|e| EtlError::Storage(format!("commit failed: {}", e)))?;

        info!("💾 Replaced table '{}' with {} rows", schema.table, inserted);
        Ok(inserted)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Int(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            // Decimals bind as their literal text; NUMERIC affinity in the
            // store converts them without a float round-trip.
            Value::Num(d) => ToSqlOutput::Owned(rusqlite::types::Value::Text(d.to_string())),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn value_from_sql(cell: ValueRef<'_>) -> Result<Value, EtlError> {
    match cell {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::Int(i)),
        ValueRef::Real(f) => Decimal::try_from(f)
            .map(Value::Num)
            .map_err(|e| EtlError::Query(format!("unrepresentable real {}: {}", f, e))),
        ValueRef::Text(t) => Ok(Value::Text(String::from_utf8_lossy(t).into_owned())),
        ValueRef::Blob(_) => Err(EtlError::Query(
            "blob column in aggregation result".to_string(),
        )),
    }
}

/// Interrupts the connection if the armed scope outlives the deadline.
/// Dropping the guard disarms the timer.
struct DeadlineGuard {
    cancel: mpsc::Sender<()>,
}

impl DeadlineGuard {
    fn arm(conn: &Connection, deadline: Duration) -> Self {
        let handle: InterruptHandle = conn.get_interrupt_handle();
        let (cancel, armed) = mpsc::channel();
        thread::spawn(move || {
            if matches!(armed.recv_timeout(deadline), Err(RecvTimeoutError::Timeout)) {
                handle.interrupt();
            }
        });
        Self { cancel }
    }
}

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        let _ = self.cancel.send(());
    }
}
