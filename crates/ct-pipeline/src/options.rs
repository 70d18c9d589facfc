//! Materialization options for pipeline models

use ct_core::{CoreError, CoreResult, Materialization, TableModelConfig, TableSpec};
use std::collections::BTreeMap;
use std::str::FromStr;

/// How a model is registered and, for tables, where it is persisted.
///
/// Storage fields are ignored for ephemeral models.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelOptions {
    pub materialize: Materialization,
    /// Target database; the session default when unset
    pub database: Option<String>,
    /// Task name for ephemeral models, table name for table models
    pub alias: Option<String>,
    pub on_cluster: Option<String>,
    pub engine: Option<String>,
    pub partition_by: Option<String>,
    pub primary_key: Option<String>,
    pub order_by: Option<String>,
    pub settings: BTreeMap<String, String>,
}

impl ModelOptions {
    pub fn ephemeral() -> Self {
        Self::default()
    }

    /// Table materialization with the given engine
    pub fn table(engine: impl Into<String>) -> Self {
        Self {
            materialize: Materialization::Table,
            engine: Some(engine.into()),
            ..Self::default()
        }
    }

    /// Parse the materialization mode from text, e.g. `"table"`
    pub fn with_materialization(mut self, mode: &str) -> CoreResult<Self> {
        self.materialize = Materialization::from_str(mode)?;
        Ok(self)
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn on_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.on_cluster = Some(cluster.into());
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn partition_by(mut self, expr: impl Into<String>) -> Self {
        self.partition_by = Some(expr.into());
        self
    }

    pub fn primary_key(mut self, expr: impl Into<String>) -> Self {
        self.primary_key = Some(expr.into());
        self
    }

    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    pub fn setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Alias if set and non-empty, else `name`
    pub fn alias_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.alias.as_deref().filter(|a| !a.is_empty()).unwrap_or(name)
    }

    /// Storage spec for table `name`.
    ///
    /// Requires a non-empty engine, and a database from the options or
    /// `default_database`.
    pub fn table_spec(&self, name: &str, default_database: Option<&str>) -> CoreResult<TableSpec> {
        let engine = self
            .engine
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                CoreError::configuration(format!("Must specify engine for table model '{}'", name))
            })?;

        let database = self
            .database
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(default_database)
            .ok_or_else(|| {
                CoreError::configuration(format!(
                    "No database for table model '{}': set one in the model options or the session",
                    name
                ))
            })?;

        let mut spec = TableSpec::new(database, name, engine);
        spec.cluster = self.on_cluster.clone();
        spec.partition_by = self.partition_by.clone();
        spec.order_by = self.order_by.clone();
        spec.primary_key = self.primary_key.clone();
        spec.settings = self.settings.clone();
        Ok(spec)
    }
}

impl From<&TableModelConfig> for ModelOptions {
    fn from(config: &TableModelConfig) -> Self {
        Self {
            materialize: Materialization::Table,
            database: config.database.clone(),
            alias: config.alias.clone(),
            on_cluster: config.on_cluster.clone(),
            engine: Some(config.engine.clone()),
            partition_by: config.partition_by.clone(),
            primary_key: config.primary_key.clone(),
            order_by: config.order_by.clone(),
            settings: config.settings.clone(),
        }
    }
}
