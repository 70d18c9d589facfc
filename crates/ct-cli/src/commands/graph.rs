//! Graph command implementation

use anyhow::Result;
use ct_pipeline::GraphFormat;

use crate::cli::{GlobalArgs, GraphArgs, GraphOutput};
use crate::commands::common::load_project;

/// Execute the graph command
pub fn execute(args: &GraphArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let format = match args.format {
        GraphOutput::Dot => GraphFormat::Dot,
        GraphOutput::Text => GraphFormat::Text,
    };
    print!("{}", project.pipeline.visualize(format));
    Ok(())
}
