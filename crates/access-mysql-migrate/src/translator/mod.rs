//! Schema translation from Access metadata to MySQL DDL.
//!
//! For every table the translator reads column metadata and the primary key
//! from a [`SchemaIntrospector`], maps each column through the [`TypeMap`] and
//! renders a re-runnable `DROP TABLE IF EXISTS` / `CREATE TABLE` pair. Tables
//! without a declared key get a synthetic auto-increment key column.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::identifier::{mysql_table_name, quote_mysql};
use crate::core::{ColumnDefinition, SchemaIntrospector, TableDefinition};
use crate::error::{MigrateError, Result};
use crate::typemap::TypeMap;

/// Name of the synthetic key column added to tables without a primary key.
pub const FALLBACK_PRIMARY_KEY_NAME: &str = "fallback_rowid";

/// Type of the synthetic key column.
pub const FALLBACK_PRIMARY_KEY_DATATYPE: &str = "INTEGER AUTO_INCREMENT";

/// Builds MySQL table definitions from source metadata.
pub struct SchemaTranslator<I: SchemaIntrospector + ?Sized> {
    introspector: Arc<I>,
    type_map: TypeMap,
    escape_table_names: bool,
}

impl<I: SchemaIntrospector + ?Sized> SchemaTranslator<I> {
    /// Create a translator over the given metadata source.
    pub fn new(introspector: Arc<I>, type_map: TypeMap) -> Self {
        Self {
            introspector,
            type_map,
            escape_table_names: false,
        }
    }

    /// Quote table names in generated DDL.
    pub fn escape_table_names(mut self, escape: bool) -> Self {
        self.escape_table_names = escape;
        self
    }

    /// Map a source type name to its MySQL type name.
    pub fn map_type(&self, source_type: &str) -> String {
        self.type_map.map_type(source_type)
    }

    /// Escaped primary key column names in key order (empty if none).
    pub async fn resolve_primary_keys(&self, table: &str) -> Result<Vec<String>> {
        let pk = self.introspector.primary_key(table).await?;
        pk.columns.iter().map(|c| quote_column(table, c)).collect()
    }

    /// Rendered column definitions (`` `name` TYPE(size) ``) in source order.
    pub async fn resolve_columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .column_definitions(table)
            .await?
            .iter()
            .map(ColumnDefinition::render)
            .collect())
    }

    async fn column_definitions(&self, table: &str) -> Result<Vec<ColumnDefinition>> {
        let columns = self.introspector.columns(table).await?;
        columns
            .iter()
            .map(|col| {
                Ok(ColumnDefinition {
                    name: quote_column(table, &col.name)?,
                    type_expr: self.type_map.type_expression(table, col)?,
                })
            })
            .collect()
    }

    /// Build the full target definition for a table.
    pub async fn build_definition(&self, table: &str) -> Result<TableDefinition> {
        info!(table, "Generating table definition");

        let mut columns = self.column_definitions(table).await?;
        if columns.is_empty() {
            return Err(MigrateError::malformed(table, "table has no columns"));
        }

        let mut primary_key_columns = self.resolve_primary_keys(table).await?;
        let used_fallback_key = primary_key_columns.is_empty();

        if used_fallback_key {
            let fallback = quote_mysql(FALLBACK_PRIMARY_KEY_NAME)?;
            if columns.iter().any(|c| c.name.eq_ignore_ascii_case(&fallback)) {
                return Err(MigrateError::malformed(
                    table,
                    format!(
                        "no primary key and a column already named {}",
                        FALLBACK_PRIMARY_KEY_NAME
                    ),
                ));
            }
            debug!(table, "No primary key declared, adding {}", FALLBACK_PRIMARY_KEY_NAME);
            columns.push(ColumnDefinition {
                name: fallback.clone(),
                type_expr: FALLBACK_PRIMARY_KEY_DATATYPE.to_string(),
            });
            primary_key_columns.push(fallback);
        }

        Ok(TableDefinition {
            table_name: mysql_table_name(table, self.escape_table_names)
                .map_err(|e| MigrateError::malformed(table, e.to_string()))?,
            columns,
            primary_key_columns,
            used_fallback_key,
        })
    }

    /// `DROP TABLE IF EXISTS` plus `CREATE TABLE` for one table.
    pub async fn generate_create_table_query(&self, table: &str) -> Result<String> {
        let ddl = self.build_definition(table).await?.to_ddl();
        debug!(table, ddl = %ddl, "Generated DDL");
        Ok(ddl)
    }

    /// Translate several tables into one script.
    ///
    /// Fails on the first schema error; no partial script is returned.
    pub async fn generate_script(&self, tables: &[String]) -> Result<DdlScript> {
        let mut definitions = Vec::with_capacity(tables.len());
        for table in tables {
            definitions.push(self.build_definition(table).await?);
        }
        Ok(DdlScript { definitions })
    }
}

/// Quote a column name, reporting invalid names against their table.
fn quote_column(table: &str, column: &str) -> Result<String> {
    quote_mysql(column).map_err(|e| MigrateError::malformed(table, e.to_string()))
}

/// Combined DDL for a set of tables.
#[derive(Debug, Clone, Default)]
pub struct DdlScript {
    definitions: Vec<TableDefinition>,
}

impl DdlScript {
    pub fn definitions(&self) -> &[TableDefinition] {
        &self.definitions
    }

    /// One DDL fragment per table, in table order.
    pub fn fragments(&self) -> Vec<String> {
        self.definitions.iter().map(TableDefinition::to_ddl).collect()
    }

    /// Script text as written to disk.
    pub fn render(&self) -> String {
        let mut out = self.fragments().join("\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Individual statements for execution, without terminators.
    pub fn statements(&self) -> Vec<String> {
        self.definitions
            .iter()
            .flat_map(|d| [d.drop_statement(), d.create_statement()])
            .collect()
    }

    /// Write the rendered script, replacing any previous file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        info!(path = %path.display(), tables = self.definitions.len(), "Wrote DDL script");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
