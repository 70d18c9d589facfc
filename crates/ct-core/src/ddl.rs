//! CREATE TABLE / INSERT generation for table materialization.
//!
//! Column order and clause order are part of the output contract: other
//! tooling parses this DDL, so the layout below must not drift.

use crate::model::Model;
use crate::table_spec::{non_empty, on_cluster_clause, TableSpec};

/// The pair of statements that persist a model into a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStatements {
    /// `CREATE TABLE ...`
    pub create: String,
    /// `INSERT INTO ... (*)` followed by the compiled query
    pub insert: String,
}

/// Build the DDL and DML that create `spec` and fill it from `model`.
///
/// Pure string building: no I/O, same input gives byte-identical output.
pub fn generate_create_and_insert(model: &dyn Model, spec: &TableSpec) -> CreateTableStatements {
    let target = spec.qualified_name();

    let mut create = format!("CREATE TABLE {}", target);
    create.push_str(&on_cluster_clause(spec.cluster()));
    create.push('\n');

    let columns = model
        .schema()
        .columns()
        .iter()
        .map(|c| format!("\t{} {}", c.name, c.data_type))
        .collect::<Vec<_>>()
        .join(",\n");
    create.push_str(&format!("(\n{}\n)\n", columns));
    create.push_str(&format!("ENGINE = {}\n", spec.engine));

    if let Some(expr) = non_empty(&spec.partition_by) {
        create.push_str(&format!("PARTITION BY {}\n", expr));
    }
    if let Some(expr) = non_empty(&spec.order_by) {
        create.push_str(&format!("ORDER BY {}\n", expr));
    }
    if let Some(expr) = non_empty(&spec.primary_key) {
        create.push_str(&format!("PRIMARY KEY {}\n", expr));
    }
    if !spec.settings.is_empty() {
        let settings = spec
            .settings
            .iter()
            .map(|(k, v)| format!("{} = {}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        create.push_str(&format!("SETTINGS {}", settings));
    }

    let insert = format!("INSERT INTO {} (*)\n{}", target, model.compile());

    CreateTableStatements { create, insert }
}

#[cfg(test)]
#[path = "ddl_test.rs"]
mod tests;
