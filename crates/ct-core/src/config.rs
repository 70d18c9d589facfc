//! Connection settings and the `ct.yml` project file

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Store backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// ClickHouse over its HTTP interface (default)
    #[default]
    ClickHouse,
    /// Embedded DuckDB, for local development of ephemeral pipelines
    DuckDb,
}

/// Parameters used to open a store connection.
///
/// This is a plain value: sessions hold one and open a fresh connection
/// from it for every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: Backend,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Default database for unqualified names and `list_tables`
    #[serde(default)]
    pub database: Option<String>,

    /// Use HTTPS for the ClickHouse HTTP interface
    #[serde(default)]
    pub secure: bool,

    /// DuckDB database file (`:memory:` if unset)
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: None,
            secure: false,
            path: None,
        }
    }
}

impl SessionConfig {
    /// Copy of this config with a different default database
    pub fn with_database(&self, database: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            ..self.clone()
        }
    }

    /// Default database, ignoring an empty string
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref().filter(|d| !d.is_empty())
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8123
}

fn default_user() -> String {
    "default".to_string()
}

/// A physical table registered as a zero-dependency source task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub database: String,
    pub table: String,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Table materialization for a SQL-file model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableModelConfig {
    /// Name of the SQL model (lower-cased file name)
    pub model: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    pub engine: String,
    #[serde(default)]
    pub on_cluster: Option<String>,
    #[serde(default)]
    pub partition_by: Option<String>,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

/// Project file (`ct.yml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Log every statement sent to the store
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub connection: SessionConfig,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// Files or directories containing SQL models, relative to the project
    #[serde(default)]
    pub model_paths: Vec<String>,

    /// SQL models persisted as tables
    #[serde(default)]
    pub tables: Vec<TableModelConfig>,
}

impl ProjectConfig {
    /// Load a project file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: ProjectConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for ct.yml or ct.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("ct.yml");
        let yaml_path = dir.join("ct.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::configuration("Project name cannot be empty"));
        }

        if self.sources.is_empty() && self.model_paths.is_empty() {
            return Err(CoreError::configuration(
                "At least one source or model_paths entry must be specified",
            ));
        }

        for table in &self.tables {
            if table.engine.trim().is_empty() {
                return Err(CoreError::configuration(format!(
                    "Must specify engine for table model '{}'",
                    table.model
                )));
            }
        }

        Ok(())
    }

    /// Model paths resolved against the project root
    pub fn model_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.model_paths.iter().map(|p| root.join(p)).collect()
    }

    /// Connection settings with a relative DuckDB `path` resolved against
    /// the project root
    pub fn connection_absolute(&self, root: &Path) -> SessionConfig {
        let mut connection = self.connection.clone();
        if let Some(path) = connection.path.as_deref() {
            if !path.is_empty() && path != ":memory:" && Path::new(path).is_relative() {
                connection.path = Some(root.join(path).display().to_string());
            }
        }
        connection
    }

    /// Table configuration for a model, if it is persisted
    pub fn table_for(&self, model: &str) -> Option<&TableModelConfig> {
        self.tables.iter().find(|t| t.model == model)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
