//! CLI command implementations

pub(crate) mod common;
pub(crate) mod graph;
pub(crate) mod ls;
pub(crate) mod run;
