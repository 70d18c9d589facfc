//! Error types for ct-pipeline

use ct_core::CoreError;
use ct_db::DbError;
use thiserror::Error;

/// Errors raised while building or running a pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Graph, registration or configuration error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Store error outside of a task
    #[error(transparent)]
    Db(#[from] DbError),

    /// P001: A task asked for an argument it did not declare
    #[error("[P001] Task argument '{name}' is not available")]
    MissingArgument { name: String },

    /// P002: A task argument has the wrong kind of value
    #[error("[P002] Task argument '{name}' is a {found}, expected a {expected}")]
    UnexpectedValue {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Result type alias for PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;
