//! In-memory recording store for tests.
//!
//! Understands just enough of the generated statements to keep a table
//! catalog: `CREATE TABLE` (columns parsed from the generated column list),
//! `DROP TABLE IF EXISTS` and `INSERT INTO`. Every executed statement is
//! logged in order.

use crate::error::{DbError, DbResult};
use crate::traits::{Connection, Connector};
use ct_core::{Column, Schema, SessionConfig};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct StoreState {
    /// `db.table` -> schema
    tables: BTreeMap<String, Schema>,
    queries: HashMap<String, Schema>,
    statements: Vec<String>,
    fail_on: Vec<String>,
    opened: usize,
    closed: usize,
}

/// Shared handle to a fake store; clones see the same state
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    state: Arc<Mutex<StoreState>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing table, e.g. a pipeline source
    pub fn with_table(self, qualified_name: &str, schema: Schema) -> Self {
        self.state
            .lock()
            .unwrap()
            .tables
            .insert(qualified_name.to_string(), schema);
        self
    }

    /// Answer `describe(sql)` with `schema`
    pub fn with_query(self, sql: &str, schema: Schema) -> Self {
        self.state
            .lock()
            .unwrap()
            .queries
            .insert(sql.to_string(), schema);
        self
    }

    /// Fail every statement containing `needle`
    pub fn fail_on(&self, needle: &str) {
        self.state.lock().unwrap().fail_on.push(needle.to_string());
    }

    /// Executed statements, in order
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    /// Qualified names of all tables
    pub fn tables(&self) -> Vec<String> {
        self.state.lock().unwrap().tables.keys().cloned().collect()
    }

    pub fn table_schema(&self, qualified_name: &str) -> Option<Schema> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(qualified_name)
            .cloned()
    }

    /// (opened, closed) connection counts
    pub fn connection_counts(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.opened, state.closed)
    }

    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(self.clone())
    }
}

impl Connector for RecordingStore {
    fn open(&self, config: &SessionConfig) -> DbResult<Box<dyn Connection>> {
        self.state.lock().unwrap().opened += 1;
        Ok(Box::new(RecordingConnection {
            state: Arc::clone(&self.state),
            database: config.database().unwrap_or("default").to_string(),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

struct RecordingConnection {
    state: Arc<Mutex<StoreState>>,
    database: String,
}

impl Connection for RecordingConnection {
    fn execute(&mut self, sql: &str) -> DbResult<()> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(sql.to_string());

        if state.fail_on.iter().any(|n| sql.contains(n.as_str())) {
            return Err(DbError::store(sql, "injected failure"));
        }

        let mut words = sql.split_whitespace();
        match (words.next(), words.next()) {
            (Some("CREATE"), Some("TABLE")) => {
                let name = words.next().unwrap_or_default().to_string();
                if state.tables.contains_key(&name) {
                    return Err(DbError::store(sql, format!("table {} already exists", name)));
                }
                state.tables.insert(name, parse_columns(sql));
            }
            (Some("DROP"), Some("TABLE")) => {
                let name = words
                    .find(|w| !matches!(*w, "IF" | "EXISTS"))
                    .unwrap_or_default();
                state.tables.remove(name);
            }
            (Some("INSERT"), Some("INTO")) => {
                let name = words.next().unwrap_or_default();
                if !state.tables.contains_key(name) {
                    return Err(DbError::store(sql, format!("table {} does not exist", name)));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn list_tables(&mut self) -> DbResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        let prefix = format!("{}.", self.database);
        Ok(state
            .tables
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(str::to_string)
            .collect())
    }

    fn describe(&mut self, query: &str) -> DbResult<Schema> {
        let state = self.state.lock().unwrap();
        if let Some(schema) = state.queries.get(query) {
            return Ok(schema.clone());
        }
        query
            .strip_prefix("SELECT * FROM ")
            .and_then(|table| state.tables.get(table))
            .cloned()
            .ok_or_else(|| DbError::store(query, "unknown relation"))
    }

    fn close(self: Box<Self>) -> DbResult<()> {
        self.state.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// Columns between the opening `(` line and the closing `)` line of
/// generated DDL, one `\tname type` per line
fn parse_columns(ddl: &str) -> Schema {
    let columns = ddl
        .lines()
        .skip_while(|l| *l != "(")
        .skip(1)
        .take_while(|l| *l != ")")
        .filter_map(|l| {
            let (name, ty) = l.trim().trim_end_matches(',').split_once(' ')?;
            Some(Column::new(name, ty))
        })
        .collect();
    Schema::new(columns)
}
