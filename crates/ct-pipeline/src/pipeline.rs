//! Pipeline builder: registers sources, SQL files and functions as tasks
//! over one session, and materializes table models.

use crate::error::PipelineResult;
use crate::options::ModelOptions;
use crate::registry::{discover_sql_files, model_from_sql, SqlFile};
use crate::session::Session;
use crate::value::{Value, ValueArgs};
use ct_core::{Materialization, Model, RunOutput, Task, TaskArgs, TaskGraph, TaskName, TaskState};
use std::path::Path;
use std::sync::Arc;

/// Name of the task every pipeline registers for its session
pub const SESSION_TASK: &str = "session";

/// Output format for [`Pipeline::visualize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphFormat {
    /// Graphviz DOT
    #[default]
    Dot,
    /// One line per task, `name <- dep, dep`
    Text,
}

/// A task graph bound to a session
#[derive(Debug, Clone)]
pub struct Pipeline {
    session: Session,
    graph: TaskGraph<Value>,
}

impl Pipeline {
    pub fn new(session: Session) -> Self {
        let mut graph = TaskGraph::new();
        let value = Value::Session(session.clone());
        graph.register(Task::from_parts(
            TaskName::new(SESSION_TASK),
            Vec::new(),
            move |_| Ok(value.clone()),
        ));
        Self { session, graph }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn graph(&self) -> &TaskGraph<Value> {
        &self.graph
    }

    /// Register a physical table as `<database>_<alias-or-table>`.
    ///
    /// The table is only described when the task runs.
    pub fn add_source(
        &mut self,
        database: &str,
        table: &str,
        alias: Option<&str>,
    ) -> PipelineResult<TaskName> {
        let alias = alias.filter(|a| !a.is_empty()).unwrap_or(table);
        let name = TaskName::try_new(format!("{}_{}", database, alias))?;

        let session = self.session.clone();
        let (database, table) = (database.to_string(), table.to_string());
        self.graph
            .register(Task::from_parts(name.clone(), Vec::new(), move |_| {
                Ok(Value::Model(session.table(&database, &table)?))
            }));
        Ok(name)
    }

    /// Register one ephemeral model per SQL file at `path`.
    ///
    /// A directory is searched recursively and its files registered in path
    /// order. Returns the registered task names.
    pub fn add_models_from_sql_path(&mut self, path: &Path) -> PipelineResult<Vec<TaskName>> {
        let files = if path.is_dir() {
            discover_sql_files(path)?
        } else {
            vec![path.to_path_buf()]
        };

        let mut names = Vec::with_capacity(files.len());
        for file in files {
            let file = SqlFile::load(&file)?;
            log::debug!("Registering SQL model '{}' from {}", file.name, file.path.display());
            self.graph.register(model_from_sql(&file, &self.session));
            names.push(file.name);
        }
        Ok(names)
    }

    /// Register a loaded SQL file under any materialization
    pub fn add_sql_model(
        &mut self,
        file: &SqlFile,
        options: &ModelOptions,
    ) -> PipelineResult<TaskName> {
        let session = self.session.clone();
        let sql = file.sql.clone();
        self.model(options, &file.name, &[], move |_| Ok(session.sql(&sql)?))
    }

    /// Register an existing plan as a zero-dependency task
    pub fn add_model(&mut self, plan: Arc<dyn Model>, name: &str) -> PipelineResult<TaskName> {
        let task = Task::from_value(name, Value::Model(plan))?;
        let name = task.name().clone();
        self.graph.register(task);
        Ok(name)
    }

    /// Register a transformation function.
    ///
    /// Ephemeral models are registered under `alias-or-name`. Table models
    /// register `compile_<alias-or-name>_model` for `f` and `name` for the
    /// materialization, which drops any existing table, creates it and
    /// inserts the plan. Returns the name of the task producing the model.
    pub fn model<F>(
        &mut self,
        options: &ModelOptions,
        name: &str,
        dependencies: &[&str],
        f: F,
    ) -> PipelineResult<TaskName>
    where
        F: Fn(&TaskArgs<Value>) -> anyhow::Result<Arc<dyn Model>> + Send + Sync + 'static,
    {
        match options.materialize {
            Materialization::Ephemeral => {
                let task = Task::new(options.alias_or(name), dependencies, move |args| {
                    f(args).map(Value::Model)
                })?;
                let registered = task.name().clone();
                self.graph.register(task);
                Ok(registered)
            }
            Materialization::Table => {
                let table = options.alias_or(name);
                let spec = options.table_spec(table, self.session.config().database())?;
                let compile_name = format!("compile_{}_model", table);

                self.graph.register(Task::new(&compile_name, dependencies, move |args| {
                    f(args).map(Value::Model)
                })?);

                let session = self.session.clone();
                let upstream = compile_name.clone();
                let task = Task::new(name, &[compile_name.as_str()], move |args| {
                    let plan = args.model(&upstream)?;
                    log::debug!("Materializing {}", spec.qualified_name());
                    let created = session.create_table_from_model(plan.as_ref(), &spec)?;
                    Ok(Value::Model(created))
                })?;
                let registered = task.name().clone();
                self.graph.register(task);
                Ok(registered)
            }
        }
    }

    /// Add every task of `other`, its session task included.
    /// Colliding names are replaced by `other`'s task.
    pub fn add_pipeline(&mut self, other: &Pipeline) {
        self.graph.merge(&other.graph);
    }

    /// Run `targets` and their dependencies (everything if empty)
    pub fn run(&self, targets: &[&str]) -> PipelineResult<RunOutput<Value>> {
        Ok(self.graph.run(targets)?)
    }

    /// Like [`run`](Self::run), reporting task state changes to `observer`
    pub fn run_with<F>(&self, targets: &[&str], observer: F) -> PipelineResult<RunOutput<Value>>
    where
        F: FnMut(&TaskName, TaskState),
    {
        Ok(self.graph.run_with(targets, observer)?)
    }

    /// Order in which `run(targets)` would execute tasks
    pub fn execution_plan(&self, targets: &[&str]) -> PipelineResult<Vec<TaskName>> {
        Ok(self.graph.execution_plan(targets)?)
    }

    pub fn visualize(&self, format: GraphFormat) -> String {
        match format {
            GraphFormat::Dot => self.graph.to_dot(),
            GraphFormat::Text => self.graph.render_text(),
        }
    }

    /// Whether a task called `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.graph.contains(name)
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
