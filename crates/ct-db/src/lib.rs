//! ct-db - Store connection layer for ClickTransform
//!
//! This crate provides the `Connection` / `Connector` facade used by
//! sessions, with a ClickHouse HTTP backend and an embedded DuckDB backend.

pub mod clickhouse;
pub mod duckdb;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

use ct_core::{Backend, SessionConfig};
use std::sync::Arc;

pub use clickhouse::ClickHouseConnector;
pub use duckdb::DuckDbConnector;
pub use error::{DbError, DbResult};
pub use traits::{Connection, Connector};

/// Connector for the backend selected in `config`
pub fn connector_for(config: &SessionConfig) -> DbResult<Arc<dyn Connector>> {
    match config.backend {
        Backend::ClickHouse => Ok(Arc::new(ClickHouseConnector::new()?)),
        Backend::DuckDb => Ok(Arc::new(DuckDbConnector::new())),
    }
}
