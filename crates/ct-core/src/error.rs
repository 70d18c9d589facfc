//! Error types for ct-core

use thiserror::Error;

/// Core error type for ClickTransform
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Project file not found
    #[error("[E001] Project file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration (missing engine, unknown materialization, ...)
    #[error("[E002] Invalid configuration: {message}")]
    Configuration { message: String },

    /// E003: SQL model file or path missing or invalid
    #[error("[E003] Not found: {path} ({reason})")]
    NotFound { path: String, reason: String },

    /// E004: Cycle among the tasks selected for a run
    #[error("[E004] Cyclic dependency between tasks: {}", tasks.join(", "))]
    CyclicDependency { tasks: Vec<String> },

    /// E005: A task depends on a name that was never registered
    #[error("[E005] Task '{task}' depends on unregistered task '{dependency}'")]
    UnresolvedDependency { task: String, dependency: String },

    /// E006: A requested run target is not registered
    #[error("[E006] Task not found: {name}")]
    TaskNotFound { name: String },

    /// E007: A task callable returned an error
    #[error("[E007] Task '{task}' failed: {source:#}")]
    TaskFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    /// E008: Empty identifier
    #[error("[E008] Empty name not allowed for {context}")]
    EmptyName { context: String },

    /// E009: IO error with file path context
    #[error("[E009] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E010: YAML parse error
    #[error("[E010] Project file parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

impl CoreError {
    /// Shorthand for a [`CoreError::Configuration`] error.
    pub fn configuration(message: impl Into<String>) -> Self {
        CoreError::Configuration {
            message: message.into(),
        }
    }

    /// Name of the task a run failed in, if the error came out of a task callable.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            CoreError::TaskFailed { task, .. } => Some(task),
            _ => None,
        }
    }
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
