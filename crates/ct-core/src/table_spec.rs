//! Persistence targets and materialization policy

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a model's result is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Materialization {
    /// Plan is handed to downstream tasks but never persisted
    #[default]
    Ephemeral,
    /// Plan is written to a table (drop if exists, create, insert)
    Table,
}

impl Materialization {
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Materialization::Ephemeral)
    }
}

impl fmt::Display for Materialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Materialization::Ephemeral => write!(f, "ephemeral"),
            Materialization::Table => write!(f, "table"),
        }
    }
}

impl FromStr for Materialization {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ephemeral" => Ok(Materialization::Ephemeral),
            "table" => Ok(Materialization::Table),
            other => Err(CoreError::configuration(format!(
                "materialization must be one of 'ephemeral', 'table', found '{}'",
                other
            ))),
        }
    }
}

/// Storage parameters for a persisted table.
///
/// Optional expressions that are `None` or empty are left out of the
/// generated DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub database: String,
    pub name: String,
    pub engine: String,
    pub cluster: Option<String>,
    pub partition_by: Option<String>,
    pub order_by: Option<String>,
    pub primary_key: Option<String>,
    /// Engine settings, rendered in key order
    pub settings: BTreeMap<String, String>,
}

impl TableSpec {
    /// Spec with only the mandatory fields set
    pub fn new(
        database: impl Into<String>,
        name: impl Into<String>,
        engine: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
            engine: engine.into(),
            cluster: None,
            partition_by: None,
            order_by: None,
            primary_key: None,
            settings: BTreeMap::new(),
        }
    }

    pub fn on_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    pub fn partition_by(mut self, expr: impl Into<String>) -> Self {
        self.partition_by = Some(expr.into());
        self
    }

    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    pub fn primary_key(mut self, expr: impl Into<String>) -> Self {
        self.primary_key = Some(expr.into());
        self
    }

    pub fn setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// `<database>.<name>`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    /// Cluster name if one is set and non-empty
    pub fn cluster(&self) -> Option<&str> {
        non_empty(&self.cluster)
    }
}

/// Treat `Some("")` the same as `None`
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// ` ON CLUSTER '<cluster>'`, with backslash and single quote escaped
pub fn on_cluster_clause(cluster: Option<&str>) -> String {
    match cluster {
        Some(c) if !c.is_empty() => {
            format!(" ON CLUSTER '{}'", c.replace('\\', "\\\\").replace('\'', "\\'"))
        }
        _ => String::new(),
    }
}
