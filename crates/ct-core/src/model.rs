//! The narrow capability set the engine needs from a logical plan.
//!
//! Plans are produced outside the engine (by the store, from SQL text, or by
//! user transformation functions) and are never inspected beyond their
//! [`Schema`] and their compiled SQL.

use std::fmt;
use std::sync::Arc;

/// A single output column of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Store type name, rendered verbatim into DDL (e.g. `Nullable(String)`)
    pub data_type: String,
}

impl Column {
    /// Create a column from a name and a type name
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Ordered list of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

impl<N: Into<String>, T: Into<String>> FromIterator<(N, T)> for Schema {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, ty)| Column::new(name, ty))
                .collect(),
        }
    }
}

/// An unexecuted relational query.
///
/// Implementations must be immutable: every transformation produces a new
/// model.
pub trait Model: fmt::Debug + Send + Sync {
    /// Output schema, in column order
    fn schema(&self) -> &Schema;

    /// Executable SQL text for this plan
    fn compile(&self) -> String;
}

/// A plan backed by SQL text whose schema was reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlModel {
    sql: String,
    schema: Schema,
}

impl SqlModel {
    /// Wrap a query. Trailing semicolons and surrounding whitespace are
    /// stripped so the text can be embedded as a subquery.
    pub fn new(sql: impl AsRef<str>, schema: Schema) -> Self {
        Self {
            sql: normalize_query(sql.as_ref()),
            schema,
        }
    }

    /// Reference to a physical table
    pub fn table_ref(database: &str, table: &str, schema: Schema) -> Self {
        Self::new(table_ref_query(database, table), schema)
    }

    /// Share as a trait object
    pub fn into_shared(self) -> Arc<dyn Model> {
        Arc::new(self)
    }
}

impl Model for SqlModel {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn compile(&self) -> String {
        self.sql.clone()
    }
}

/// `SELECT * FROM <database>.<table>`
pub fn table_ref_query(database: &str, table: &str) -> String {
    format!("SELECT * FROM {}.{}", database, table)
}

/// Strip surrounding whitespace and trailing semicolons
pub fn normalize_query(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim_end().to_string()
}
