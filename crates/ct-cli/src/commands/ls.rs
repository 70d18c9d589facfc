//! List command implementation

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{GlobalArgs, LsArgs, LsOutput};
use crate::commands::common::{load_project, parse_select, LoadedProject};

/// Task information for display
#[derive(Debug, Serialize)]
struct TaskInfo {
    name: String,
    kind: &'static str,
    depends_on: Vec<String>,
}

/// Execute the ls command
pub fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let targets = parse_select(args.select.as_deref());
    let tasks = task_infos(&project, &targets)?;

    match args.output {
        LsOutput::Text => print_table(&tasks),
        LsOutput::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
    }
    Ok(())
}

/// Tasks in execution order
fn task_infos(project: &LoadedProject, targets: &[&str]) -> Result<Vec<TaskInfo>> {
    let plan = project
        .pipeline
        .execution_plan(targets)
        .context("Failed to plan pipeline")?;

    Ok(plan
        .iter()
        .map(|name| TaskInfo {
            name: name.to_string(),
            kind: project.kind_of(name),
            depends_on: project
                .pipeline
                .graph()
                .dependencies(name)
                .iter()
                .map(|d| d.to_string())
                .collect(),
        })
        .collect())
}

/// Print tasks in table format
fn print_table(tasks: &[TaskInfo]) {
    let name_width = tasks
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let kind_width = 9;

    println!(
        "{:<name_width$}  {:<kind_width$}  DEPENDS_ON",
        "NAME",
        "KIND",
        name_width = name_width,
        kind_width = kind_width
    );
    println!(
        "{:-<name_width$}  {:-<kind_width$}  {}",
        "",
        "",
        "-".repeat(40),
        name_width = name_width,
        kind_width = kind_width
    );

    for task in tasks {
        let deps = if task.depends_on.is_empty() {
            "-".to_string()
        } else {
            task.depends_on.join(", ")
        };
        println!(
            "{:<name_width$}  {:<kind_width$}  {}",
            task.name,
            task.kind,
            deps,
            name_width = name_width,
            kind_width = kind_width
        );
    }

    println!();
    println!("{} tasks", tasks.len());
}
