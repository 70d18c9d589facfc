//! Session: connection configuration plus the store operations built on it

use ct_core::model::{normalize_query, table_ref_query};
use ct_core::table_spec::on_cluster_clause;
use ct_core::{generate_create_and_insert, Model, SessionConfig, SqlModel, TableSpec};
use ct_db::{connector_for, Connection, Connector, DbResult};
use std::fmt;
use std::sync::Arc;

/// Immutable connection configuration.
///
/// A session is not a live connection: every operation opens its own
/// connection, runs one or two statements and closes it before returning.
#[derive(Clone)]
pub struct Session {
    config: Arc<SessionConfig>,
    connector: Arc<dyn Connector>,
    verbose: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.connector.backend_name())
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("database", &self.config.database)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start building a session
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Copy of this session that logs every statement at info level
    pub fn enable_logging(&self) -> Session {
        Session {
            verbose: true,
            ..self.clone()
        }
    }

    /// Copy of this session with a different default database
    pub fn set_database(&self, database: &str) -> Session {
        Session {
            config: Arc::new(self.config.with_database(database)),
            ..self.clone()
        }
    }

    /// Reference to a physical table; only its schema is fetched
    pub fn table(&self, database: &str, table: &str) -> DbResult<Arc<dyn Model>> {
        self.describe(&table_ref_query(database, table))
    }

    /// Plan for a raw SQL query; only its schema is fetched
    pub fn sql(&self, query: &str) -> DbResult<Arc<dyn Model>> {
        self.describe(&normalize_query(query))
    }

    /// `DROP TABLE IF EXISTS`, optionally on a cluster
    pub fn drop_table(&self, database: &str, table: &str, cluster: Option<&str>) -> DbResult<()> {
        let sql = format!(
            "DROP TABLE IF EXISTS {}.{}{}",
            database,
            table,
            on_cluster_clause(cluster)
        );
        self.with_connection(|conn| self.execute(conn, &sql))
    }

    /// Tables in the session's default database
    pub fn list_tables(&self) -> DbResult<Vec<String>> {
        self.with_connection(|conn| conn.list_tables())
    }

    /// Persist `model` as the table described by `spec` and return a
    /// reference to the new table.
    ///
    /// An existing table with the same name is dropped first. The sequence is
    /// not transactional: if the insert fails the new table stays, empty.
    pub fn create_table_from_model(
        &self,
        model: &dyn Model,
        spec: &TableSpec,
    ) -> DbResult<Arc<dyn Model>> {
        let existing = self.set_database(&spec.database).list_tables()?;
        if existing.iter().any(|t| *t == spec.name) {
            log::debug!("Dropping existing table {}", spec.qualified_name());
            self.drop_table(&spec.database, &spec.name, spec.cluster())?;
        }

        let statements = generate_create_and_insert(model, spec);
        self.with_connection(|conn| {
            self.execute(conn, &statements.create)?;
            self.execute(conn, &statements.insert)
        })?;

        self.table(&spec.database, &spec.name)
    }

    fn describe(&self, query: &str) -> DbResult<Arc<dyn Model>> {
        let schema = self.with_connection(|conn| {
            self.log_statement(&format!("DESCRIBE {}", query));
            conn.describe(query)
        })?;
        Ok(SqlModel::new(query, schema).into_shared())
    }

    fn execute(&self, conn: &mut dyn Connection, sql: &str) -> DbResult<()> {
        self.log_statement(sql);
        conn.execute(sql)
    }

    fn log_statement(&self, sql: &str) {
        if self.verbose {
            log::info!("{}", sql);
        } else {
            log::debug!("{}", sql);
        }
    }

    /// Open a connection, run `op`, and close the connection on every path.
    /// An error from `op` takes precedence over an error from closing.
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut dyn Connection) -> DbResult<T>,
    ) -> DbResult<T> {
        let mut conn = self.connector.open(&self.config)?;
        let result = op(conn.as_mut());
        let closed = conn.close();
        let value = result?;
        closed?;
        Ok(value)
    }
}

/// Builder for [`Session`]
#[derive(Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    connector: Option<Arc<dyn Connector>>,
    verbose: bool,
}

impl SessionBuilder {
    /// Use `config` for every connection the session opens
    pub fn from_configs(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the connector picked from `config.backend`
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Log every statement at info level
    pub fn enable_logging(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn create(self) -> DbResult<Session> {
        let connector = match self.connector {
            Some(c) => c,
            None => connector_for(&self.config)?,
        };
        Ok(Session {
            config: Arc::new(self.config),
            connector,
            verbose: self.verbose,
        })
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
