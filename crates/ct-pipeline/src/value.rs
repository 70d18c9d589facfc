//! Values flowing between pipeline tasks

use crate::error::{PipelineError, PipelineResult};
use crate::session::Session;
use ct_core::{Model, TaskArgs};
use std::fmt;
use std::sync::Arc;

/// Result of a pipeline task
#[derive(Clone)]
pub enum Value {
    /// The pipeline's session
    Session(Session),
    /// An unexecuted plan or a table reference
    Model(Arc<dyn Model>),
    /// Task with no meaningful result
    Unit,
}

impl Value {
    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Session(_) => "session",
            Value::Model(_) => "model",
            Value::Unit => "unit",
        }
    }

    pub fn as_model(&self) -> Option<&Arc<dyn Model>> {
        match self {
            Value::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_session(&self) -> Option<&Session> {
        match self {
            Value::Session(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Session(s) => f.debug_tuple("Session").field(s).finish(),
            Value::Model(m) => f.debug_tuple("Model").field(&m.compile()).finish(),
            Value::Unit => f.write_str("Unit"),
        }
    }
}

impl From<Arc<dyn Model>> for Value {
    fn from(model: Arc<dyn Model>) -> Self {
        Value::Model(model)
    }
}

impl From<Session> for Value {
    fn from(session: Session) -> Self {
        Value::Session(session)
    }
}

/// Typed access to task arguments
pub trait ValueArgs {
    /// Plan produced by the dependency `name`
    fn model(&self, name: &str) -> PipelineResult<Arc<dyn Model>>;

    /// Session produced by the dependency `name`
    fn session(&self, name: &str) -> PipelineResult<Session>;
}

impl ValueArgs for TaskArgs<Value> {
    fn model(&self, name: &str) -> PipelineResult<Arc<dyn Model>> {
        match lookup(self, name)? {
            Value::Model(m) => Ok(Arc::clone(m)),
            other => Err(unexpected(name, "model", other)),
        }
    }

    fn session(&self, name: &str) -> PipelineResult<Session> {
        match lookup(self, name)? {
            Value::Session(s) => Ok(s.clone()),
            other => Err(unexpected(name, "session", other)),
        }
    }
}

fn lookup<'a>(args: &'a TaskArgs<Value>, name: &str) -> PipelineResult<&'a Value> {
    args.get(name).ok_or_else(|| PipelineError::MissingArgument {
        name: name.to_string(),
    })
}

fn unexpected(name: &str, expected: &'static str, found: &Value) -> PipelineError {
    PipelineError::UnexpectedValue {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}
