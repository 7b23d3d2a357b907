//! Schema metadata types for source tables and generated target definitions.
//!
//! Source metadata ([`ColumnDescriptor`], [`PrimaryKeyInfo`]) is produced by a
//! [`SchemaIntrospector`](super::traits::SchemaIntrospector) and consumed by the
//! schema translator, which builds a [`TableDefinition`] per table.

use serde::{Deserialize, Serialize};

/// Column metadata reported by the source's column introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name as declared in the source.
    pub name: String,

    /// Source type name (e.g. "VARCHAR", "LONGCHAR", "COUNTER").
    pub source_type: String,

    /// Column size for character/binary types, precision for numerics.
    pub size: Option<i32>,

    /// Decimal digits (scale) for numeric types.
    pub decimal_digits: Option<i16>,
}

impl ColumnDescriptor {
    /// Create a descriptor without size information.
    pub fn new(name: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            size: None,
            decimal_digits: None,
        }
    }

    /// Set the column size.
    pub fn with_size(mut self, size: i32) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the decimal digits.
    pub fn with_digits(mut self, digits: i16) -> Self {
        self.decimal_digits = Some(digits);
        self
    }
}

/// Ordered primary key columns of a source table (empty when none declared).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyInfo {
    /// Member columns in key-sequence order.
    pub columns: Vec<String>,
}

impl PrimaryKeyInfo {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// A table with no declared primary key.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A single target column: escaped name plus target type expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDefinition {
    /// Escaped column name (e.g. `` `id` ``).
    pub name: String,

    /// Target type including any size suffix (e.g. `VARCHAR(50)`).
    pub type_expr: String,
}

impl ColumnDefinition {
    /// Render as it appears inside `CREATE TABLE`.
    pub fn render(&self) -> String {
        format!("{} {}", self.name, self.type_expr)
    }
}

/// Target table definition derived from source metadata.
///
/// Invariant: `primary_key_columns` is never empty. When the source declares
/// no key, the translator appends a synthetic auto-increment column and sets
/// `used_fallback_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDefinition {
    /// Table name as rendered in DDL (escaped only when configured).
    pub table_name: String,

    /// Columns in source order, fallback column last when present.
    pub columns: Vec<ColumnDefinition>,

    /// Escaped primary key column names in key order.
    pub primary_key_columns: Vec<String>,

    /// Whether the primary key is the synthetic fallback column.
    pub used_fallback_key: bool,
}

impl TableDefinition {
    /// `DROP TABLE IF EXISTS` statement (without terminator).
    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table_name)
    }

    /// `CREATE TABLE` statement (without terminator).
    pub fn create_statement(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDefinition::render).collect();
        format!(
            "CREATE TABLE {}({}, PRIMARY KEY ({}))",
            self.table_name,
            columns.join(", "),
            self.primary_key_columns.join(", ")
        )
    }

    /// Full re-runnable DDL fragment for this table.
    pub fn to_ddl(&self) -> String {
        format!("{};\n{};", self.drop_statement(), self.create_statement())
    }
}
