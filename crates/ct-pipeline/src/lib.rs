//! ct-pipeline - Pipeline builder for ClickTransform
//!
//! A [`Pipeline`] binds a task graph to a [`Session`]. Sources, SQL files
//! and transformation functions are registered as tasks that produce
//! [`Model`](ct_core::Model)s; table models are persisted through the
//! session when the pipeline runs.

pub mod error;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod session;
pub mod value;

pub use error::{PipelineError, PipelineResult};
pub use options::ModelOptions;
pub use pipeline::{GraphFormat, Pipeline, SESSION_TASK};
pub use registry::{discover_sql_files, model_from_fn, model_from_sql_file, SqlFile};
pub use session::{Session, SessionBuilder};
pub use value::{Value, ValueArgs};
