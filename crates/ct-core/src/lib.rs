//! ct-core - Core library for ClickTransform
//!
//! This crate provides the task graph that schedules models, the narrow
//! `Model` capability set the engine consumes, table specifications and the
//! DDL/DML generator used for table materialization, and the project
//! configuration shared by the other ClickTransform crates.

pub mod config;
pub mod ddl;
pub mod error;
pub mod graph;
pub mod model;
pub mod table_spec;
pub mod task_name;

pub use config::{Backend, ProjectConfig, SessionConfig, SourceConfig, TableModelConfig};
pub use ddl::{generate_create_and_insert, CreateTableStatements};
pub use error::{CoreError, CoreResult};
pub use graph::{RunOutput, Task, TaskArgs, TaskGraph, TaskState};
pub use model::{Column, Model, Schema, SqlModel};
pub use table_spec::{Materialization, TableSpec};
pub use task_name::TaskName;
