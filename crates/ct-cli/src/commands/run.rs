//! Run command implementation

use anyhow::Result;
use ct_core::{CoreError, TaskState};
use ct_pipeline::{PipelineError, SESSION_TASK};
use std::collections::HashMap;
use std::time::Instant;

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::common::{load_project, parse_select};

/// Execute the run command
pub fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let start_time = Instant::now();
    let project = load_project(global)?;
    let targets = parse_select(args.select.as_deref());

    println!("Running {}", project.config.name);

    let mut started: HashMap<String, Instant> = HashMap::new();
    let mut completed = 0usize;
    let result = project.pipeline.run_with(&targets, |name, state| {
        if name == SESSION_TASK {
            return;
        }
        match state {
            TaskState::Resolving => {
                started.insert(name.to_string(), Instant::now());
            }
            TaskState::Done => {
                let elapsed = started
                    .get(name.as_str())
                    .map(|t| t.elapsed().as_millis())
                    .unwrap_or_default();
                println!("  ✓ {} [{}ms]", name, elapsed);
                completed += 1;
            }
            TaskState::Registered | TaskState::Failed => {}
        }
    });

    match result {
        Ok(_) => {
            println!();
            println!(
                "Completed {} tasks in {:.2}s",
                completed,
                start_time.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(err) => {
            if let PipelineError::Core(CoreError::TaskFailed { task, source }) = &err {
                println!("  ✗ {} - {:#}", task, source);
            }
            println!();
            println!("Completed {} tasks before failure", completed);
            Err(anyhow::Error::new(err).context("Pipeline run failed"))
        }
    }
}
