//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// ClickTransform - build and run model pipelines against ClickHouse
#[derive(Parser, Debug)]
#[command(name = "ct")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Log every statement sent to the store
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the connection password
    #[arg(long, global = true, env = "CT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline, materializing table models
    Run(RunArgs),

    /// List tasks in execution order with their dependencies
    Ls(LsArgs),

    /// Render the task graph
    Graph(GraphArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Tasks to run with their dependencies (comma-separated, default: all)
    #[arg(short, long)]
    pub select: Option<String>,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: LsOutput,

    /// Tasks to list with their dependencies (comma-separated, default: all)
    #[arg(short, long)]
    pub select: Option<String>,
}

/// List output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsOutput {
    /// Table format
    Text,
    /// JSON output
    Json,
}

/// Arguments for the graph command
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "dot")]
    pub format: GraphOutput,
}

/// Graph output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphOutput {
    /// Graphviz DOT
    Dot,
    /// One line per task
    Text,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
