//! Connection facade traits

use crate::error::DbResult;
use ct_core::{Schema, SessionConfig};

/// An open handle to the analytical store.
///
/// Handles are short-lived: callers open one per operation, run one or two
/// statements and close it before returning.
pub trait Connection {
    /// Execute a statement, discarding any result rows
    fn execute(&mut self, sql: &str) -> DbResult<()>;

    /// Names of the tables in the connection's default database
    fn list_tables(&mut self) -> DbResult<Vec<String>>;

    /// Output schema of a query, without running it
    fn describe(&mut self, query: &str) -> DbResult<Schema>;

    /// Release the handle
    fn close(self: Box<Self>) -> DbResult<()>;
}

/// Opens [`Connection`]s from a [`SessionConfig`].
///
/// Implementations must be Send + Sync so sessions can be shared.
pub trait Connector: Send + Sync {
    fn open(&self, config: &SessionConfig) -> DbResult<Box<dyn Connection>>;

    /// Backend identifier for logging
    fn backend_name(&self) -> &'static str;
}
