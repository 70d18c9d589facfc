//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use ct_core::{ProjectConfig, TaskName};
use ct_pipeline::{discover_sql_files, ModelOptions, Pipeline, Session, SqlFile};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;
use crate::logging;

/// A project file turned into a pipeline
pub(crate) struct LoadedProject {
    pub config: ProjectConfig,
    pub pipeline: Pipeline,
    /// Tasks registered from `sources`
    pub sources: HashSet<TaskName>,
    /// Tasks that materialize a table
    pub tables: HashSet<TaskName>,
}

impl LoadedProject {
    /// Short label for a task in listings
    pub fn kind_of(&self, name: &TaskName) -> &'static str {
        if name == ct_pipeline::SESSION_TASK {
            "session"
        } else if self.sources.contains(name) {
            "source"
        } else if self.tables.contains(name) {
            "table"
        } else {
            "ephemeral"
        }
    }
}

/// Load the project file, honouring `--config` and `--password`
pub(crate) fn load_config(global: &GlobalArgs) -> Result<(PathBuf, ProjectConfig)> {
    let root = PathBuf::from(&global.project_dir);
    let mut config = match &global.config {
        Some(path) => ProjectConfig::load(Path::new(path)),
        None => ProjectConfig::load_from_dir(&root),
    }
    .context("Failed to load project")?;

    if let Some(password) = &global.password {
        config.connection.password = password.clone();
    }
    Ok((root, config))
}

/// Build the session and register every source and SQL model
pub(crate) fn load_project(global: &GlobalArgs) -> Result<LoadedProject> {
    let (root, config) = load_config(global)?;

    let mut builder = Session::builder().from_configs(config.connection_absolute(&root));
    if global.verbose || config.verbose {
        logging::enable_verbose();
        builder = builder.enable_logging();
    }
    let session = builder.create().context("Failed to create session")?;
    let mut pipeline = Pipeline::new(session);

    let mut sources = HashSet::new();
    for source in &config.sources {
        let name = pipeline
            .add_source(&source.database, &source.table, source.alias.as_deref())
            .with_context(|| format!("Invalid source {}.{}", source.database, source.table))?;
        sources.insert(name);
    }

    let mut tables = HashSet::new();
    let mut seen = HashSet::new();
    for path in config.model_paths_absolute(&root) {
        for file in sql_files(&path)? {
            let file = SqlFile::load(&file)
                .with_context(|| format!("Failed to load SQL model {}", file.display()))?;
            let options = config
                .table_for(&file.name)
                .map(ModelOptions::from)
                .unwrap_or_default();
            let name = pipeline
                .add_sql_model(&file, &options)
                .with_context(|| format!("Failed to register model '{}'", file.name))?;
            if !options.materialize.is_ephemeral() {
                tables.insert(name);
            }
            seen.insert(file.name);
        }
    }

    for table in &config.tables {
        if !seen.contains(table.model.as_str()) {
            log::warn!("Table config for unknown model '{}' ignored", table.model);
        }
    }

    Ok(LoadedProject {
        config,
        pipeline,
        sources,
        tables,
    })
}

/// SQL files under a model path; a single file is taken as is
fn sql_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        discover_sql_files(path)
            .with_context(|| format!("Failed to read model path {}", path.display()))
    } else {
        Ok(vec![path.to_path_buf()])
    }
}

/// Split `--select a,b` into task names
pub(crate) fn parse_select(select: Option<&str>) -> Vec<&str> {
    select
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
