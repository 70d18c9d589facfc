//! env_logger setup for the CLI

use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use std::io::Write;

/// Line prefix for a record of `level`
fn prefix(level: Level) -> &'static str {
    match level {
        Level::Error => "error: ",
        Level::Warn => "warning: ",
        _ => "[verbose] ",
    }
}

/// Install env_logger on stderr: warnings always, statements and progress
/// with `--verbose`. `RUST_LOG` takes precedence when set.
pub(crate) fn init(verbose: bool) {
    let from_env = std::env::var_os("RUST_LOG").is_some();

    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .parse_env(Env::default())
        .format(|buf, record| writeln!(buf, "{}{}", prefix(record.level()), record.args()));

    if builder.try_init().is_ok() && !from_env {
        log::set_max_level(if verbose {
            LevelFilter::Info
        } else {
            LevelFilter::Warn
        });
    }
}

/// Raise the level to show statements, e.g. when the project file sets `verbose`
pub(crate) fn enable_verbose() {
    if log::max_level() < LevelFilter::Info {
        log::set_max_level(LevelFilter::Info);
    }
}
