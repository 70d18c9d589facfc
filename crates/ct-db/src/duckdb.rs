//! DuckDB backend implementation
//!
//! Embedded store for developing ephemeral pipelines locally. The session's
//! database maps to a DuckDB schema (`main` when unset). Generated table DDL
//! uses ClickHouse engine clauses and is not accepted by DuckDB.

use crate::error::{DbError, DbResult};
use crate::traits::{Connection, Connector};
use ct_core::{Column, Schema, SessionConfig};
use std::fmt;
use std::path::Path;
use std::sync::Mutex;

/// Opens DuckDB database files, or handles to an in-memory database.
///
/// Without a `path` (or with `:memory:`) every connection opened by the same
/// connector shares one in-memory database, which lives as long as the
/// connector.
#[derive(Default)]
pub struct DuckDbConnector {
    memory: Mutex<Option<duckdb::Connection>>,
}

impl fmt::Debug for DuckDbConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuckDbConnector").finish_non_exhaustive()
    }
}

impl DuckDbConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// New handle to the shared in-memory database, created on first use
    fn in_memory(&self) -> DbResult<duckdb::Connection> {
        let mut root = self
            .memory
            .lock()
            .map_err(|_| DbError::Connection("in-memory database lock poisoned".to_string()))?;

        let conn = match root.take() {
            Some(conn) => conn,
            None => duckdb::Connection::open_in_memory()
                .map_err(|e| DbError::Connection(e.to_string()))?,
        };
        let handle = conn.try_clone();
        *root = Some(conn);
        handle.map_err(|e| DbError::Connection(e.to_string()))
    }
}

impl Connector for DuckDbConnector {
    fn open(&self, config: &SessionConfig) -> DbResult<Box<dyn Connection>> {
        let conn = match config.path.as_deref() {
            None | Some("") | Some(":memory:") => self.in_memory()?,
            Some(path) => duckdb::Connection::open(Path::new(path))
                .map_err(|e| DbError::Connection(e.to_string()))?,
        };

        Ok(Box::new(DuckDbConnection {
            conn,
            schema: config.database().unwrap_or("main").to_string(),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "duckdb"
    }
}

/// A single-operation DuckDB handle
pub struct DuckDbConnection {
    conn: duckdb::Connection,
    schema: String,
}

impl Connection for DuckDbConnection {
    fn execute(&mut self, sql: &str) -> DbResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::store(sql, e))
    }

    fn list_tables(&mut self) -> DbResult<Vec<String>> {
        let sql = "SELECT table_name FROM information_schema.tables \
                   WHERE table_schema = ? ORDER BY table_name";
        let mut stmt = self.conn.prepare(sql).map_err(|e| DbError::store(sql, e))?;
        let rows = stmt
            .query_map(duckdb::params![self.schema.as_str()], |row| row.get::<_, String>(0))
            .map_err(|e| DbError::store(sql, e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::store(sql, e))
    }

    fn describe(&mut self, query: &str) -> DbResult<Schema> {
        let sql = format!("DESCRIBE {}", query);
        let mut stmt = self.conn.prepare(&sql).map_err(|e| DbError::store(&sql, e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Column::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })
            .map_err(|e| DbError::store(&sql, e))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map(Schema::new)
            .map_err(|e| DbError::store(&sql, e))
    }

    fn close(self: Box<Self>) -> DbResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| DbError::Connection(e.to_string()))
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
