//! Turning user functions and SQL files into tasks

use crate::error::PipelineResult;
use crate::session::Session;
use crate::value::Value;
use ct_core::{CoreError, CoreResult, Model, Task, TaskArgs, TaskName};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A SQL model file read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFile {
    /// Task name: file name up to the first `.`, lower-cased
    pub name: TaskName,
    pub path: PathBuf,
    pub sql: String,
}

impl SqlFile {
    /// Read a `.sql` file (extension matched case-insensitively)
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(not_found(path, "path does not exist"));
        }
        if !path.is_file() {
            return Err(not_found(path, "not a regular file"));
        }
        if !is_sql_file(path) {
            return Err(not_found(path, "extension is not .sql"));
        }

        let name = sql_model_name(path).ok_or_else(|| CoreError::EmptyName {
            context: format!("SQL model file {}", path.display()),
        })?;
        let sql = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(Self {
            name,
            path: path.to_path_buf(),
            sql,
        })
    }
}

/// `Orders.Daily.SQL` -> `orders`
pub fn sql_model_name(path: &Path) -> Option<TaskName> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.split('.').next().unwrap_or_default();
    TaskName::try_new(stem.to_lowercase()).ok()
}

fn is_sql_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("sql"))
}

fn not_found(path: &Path, reason: &str) -> CoreError {
    CoreError::NotFound {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// All `.sql` files under `dir`, recursively, sorted by path. Files whose
/// name starts with `.` (e.g. `.draft.sql`) have no model name and are skipped.
pub fn discover_sql_files(dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_sql_files(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_sql_files(dir: &Path, files: &mut Vec<PathBuf>) -> CoreResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            collect_sql_files(&path, files)?;
        } else if path.is_file() && is_sql_file(&path) {
            if sql_model_name(&path).is_none() {
                log::warn!("Skipping {}: file name gives no model name", path.display());
                continue;
            }
            files.push(path);
        }
    }
    Ok(())
}

/// Task for a transformation function with explicitly declared
/// dependencies. `f` receives the resolved results of `dependencies`.
pub fn model_from_fn<F>(name: &str, dependencies: &[&str], f: F) -> PipelineResult<Task<Value>>
where
    F: Fn(&TaskArgs<Value>) -> anyhow::Result<Arc<dyn Model>> + Send + Sync + 'static,
{
    Ok(Task::new(name, dependencies, move |args| {
        f(args).map(Value::Model)
    })?)
}

/// Task with no dependencies that plans the SQL text of `file` through
/// `session`
pub fn model_from_sql(file: &SqlFile, session: &Session) -> Task<Value> {
    let session = session.clone();
    let sql = file.sql.clone();
    Task::from_parts(file.name.clone(), Vec::new(), move |_| {
        Ok(Value::Model(session.sql(&sql)?))
    })
}

/// Load a SQL file and turn it into a task
pub fn model_from_sql_file(path: &Path, session: &Session) -> PipelineResult<Task<Value>> {
    let file = SqlFile::load(path)?;
    Ok(model_from_sql(&file, session))
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
