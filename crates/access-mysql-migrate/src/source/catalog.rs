//! Parsing of ODBC catalog result sets.
//!
//! Catalog calls take search patterns, so `_` and `%` in a table name match
//! other tables too. Every helper here keeps only rows whose `TABLE_NAME`
//! equals the requested table exactly.

use crate::core::{ColumnDescriptor, PrimaryKeyInfo};
use crate::error::{MigrateError, Result};

/// Rows fetched through a text buffer; `None` is SQL NULL.
pub type TextRows = Vec<Vec<Option<String>>>;

// Shared by SQLTables, SQLColumns and SQLStatistics (0-based)
const TABLE_NAME: usize = 2;

// SQLColumns
const COL_COLUMN_NAME: usize = 3;
const COL_TYPE_NAME: usize = 5;
const COL_COLUMN_SIZE: usize = 6;
const COL_DECIMAL_DIGITS: usize = 8;

// SQLStatistics
const STAT_NON_UNIQUE: usize = 3;
const STAT_INDEX_NAME: usize = 5;
const STAT_ORDINAL_POSITION: usize = 7;
const STAT_COLUMN_NAME: usize = 8;

/// Name Access gives the index behind a table's primary key.
pub const PRIMARY_KEY_INDEX: &str = "PrimaryKey";

fn field(row: &[Option<String>], idx: usize) -> Option<&str> {
    row.get(idx).and_then(|v| v.as_deref())
}

fn belongs_to(row: &[Option<String>], table: &str) -> bool {
    field(row, TABLE_NAME) == Some(table)
}

/// Whether an SQLTables result lists `table`.
pub fn lists_table(rows: &TextRows, table: &str) -> bool {
    rows.iter().any(|r| belongs_to(r, table))
}

/// Column descriptors from an SQLColumns result, in result order.
pub fn columns_from_rows(table: &str, rows: &TextRows) -> Result<Vec<ColumnDescriptor>> {
    rows.iter()
        .filter(|r| belongs_to(r, table))
        .map(|row| {
            let name = field(row, COL_COLUMN_NAME)
                .ok_or_else(|| MigrateError::malformed(table, "column without a name"))?;
            let source_type = field(row, COL_TYPE_NAME).ok_or_else(|| {
                MigrateError::malformed(table, format!("column {} has no type name", name))
            })?;
            Ok(ColumnDescriptor {
                name: name.to_string(),
                source_type: source_type.to_string(),
                size: field(row, COL_COLUMN_SIZE).and_then(|s| s.trim().parse().ok()),
                decimal_digits: field(row, COL_DECIMAL_DIGITS).and_then(|s| s.trim().parse().ok()),
            })
        })
        .collect()
}

/// Primary key from an SQLStatistics result.
///
/// Uses the unique index named [`PRIMARY_KEY_INDEX`], columns ordered by
/// `ORDINAL_POSITION`. Table statistics rows (no index name) and other
/// indexes are ignored. No such index means no primary key.
pub fn primary_key_from_statistics(table: &str, rows: &TextRows) -> PrimaryKeyInfo {
    let mut keyed: Vec<(i32, String)> = rows
        .iter()
        .filter(|r| belongs_to(r, table))
        .filter(|r| {
            field(r, STAT_INDEX_NAME).is_some_and(|n| n.eq_ignore_ascii_case(PRIMARY_KEY_INDEX))
        })
        .filter(|r| is_unique(field(r, STAT_NON_UNIQUE)))
        .filter_map(|r| {
            let name = field(r, STAT_COLUMN_NAME)?.to_string();
            let position = field(r, STAT_ORDINAL_POSITION)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0);
            Some((position, name))
        })
        .collect();
    keyed.sort_by_key(|(position, _)| *position);

    PrimaryKeyInfo::new(keyed.into_iter().map(|(_, name)| name).collect())
}

fn is_unique(non_unique: Option<&str>) -> bool {
    matches!(
        non_unique.map(str::trim),
        Some("0") | Some("false") | Some("FALSE")
    )
}
