//! Microsoft Access source over ODBC.
//!
//! **Requirements:**
//! - The `odbc` feature must be enabled
//! - An ODBC driver manager (unixODBC or the Windows one) and the
//!   "Microsoft Access Driver (*.mdb, *.accdb)" must be installed
//!
//! Column metadata comes from `SQLColumns`. The Access driver does not
//! implement `SQLPrimaryKeys`, so the primary key is read from the index
//! metadata returned by `SQLStatistics`. Rows are read with `SELECT *` on a
//! blocking thread and handed to the async side one chunk at a time. Values
//! longer than `max_text_bytes` fail the read instead of being truncated.

use std::sync::Arc;

use async_trait::async_trait;
use odbc_api::handles::Statement;
use odbc_api::sys::{self, SqlReturn};
use odbc_api::{
    buffers::TextRowSet, Connection, ConnectionOptions, Cursor, CursorImpl, DataType,
    Environment, ResultSetMetadata,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::identifier::quote_access;
use crate::core::{
    Batch, ColumnDescriptor, PrimaryKeyInfo, SchemaIntrospector, SourceReader, SqlValue,
};
use crate::error::{MigrateError, Result};

use super::catalog::{self, TextRows};
use super::types::{convert_text_to_sqlvalue, ColumnKind};

/// Text buffer size for catalog queries.
const CATALOG_TEXT_BYTES: usize = 1024;

// SQLStatistics arguments
const SQL_INDEX_ALL: u16 = 1;
const SQL_QUICK: u16 = 0;

/// Access database reader.
pub struct AccessSource {
    env: Arc<Environment>,
    connection_string: String,
    fetch_rows: usize,
    max_text_bytes: usize,
}

impl AccessSource {
    /// Open the Access file and verify a connection can be established.
    pub async fn new(config: &SourceConfig) -> Result<Self> {
        let env = Environment::new().map_err(|e| {
            MigrateError::pool(
                format!(
                    "Failed to create ODBC environment: {}. \
                     Make sure an ODBC driver manager and the Microsoft Access driver are installed.",
                    e
                ),
                "ODBC environment",
            )
        })?;

        let source = Self {
            env: Arc::new(env),
            connection_string: config.connection_string(),
            fetch_rows: config.fetch_rows,
            max_text_bytes: config.max_text_bytes,
        };

        source.connect().map(drop)?;
        info!("Connected to Access database: {}", config.path.display());
        Ok(source)
    }

    fn connect(&self) -> Result<Connection<'_>> {
        connect(&self.env, &self.connection_string)
    }

    fn table_exists(&self, conn: &Connection<'_>, table: &str) -> Result<bool> {
        let cursor = conn.tables("", "", table, "TABLE")?;
        let rows = text_rows(cursor, 16, CATALOG_TEXT_BYTES)?;
        Ok(catalog::lists_table(&rows, table))
    }

    fn table_names_sync(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let cursor = conn.tables("", "", "", "TABLE")?;
        let rows = text_rows(cursor, self.fetch_rows, CATALOG_TEXT_BYTES)?;
        Ok(rows
            .into_iter()
            .filter_map(|mut r| r.get_mut(2).and_then(Option::take))
            .collect())
    }

    fn columns_sync(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let conn = self.connect()?;
        if !self.table_exists(&conn, table)? {
            return Err(MigrateError::TableNotFound(table.to_string()));
        }

        let cursor = conn.columns("", "", table, "")?;
        let rows = text_rows(cursor, self.fetch_rows, CATALOG_TEXT_BYTES)?;
        let columns = catalog::columns_from_rows(table, &rows)?;

        debug!(table, columns = columns.len(), "Loaded column metadata");
        Ok(columns)
    }

    fn primary_key_sync(&self, table: &str) -> Result<PrimaryKeyInfo> {
        let conn = self.connect()?;
        if !self.table_exists(&conn, table)? {
            return Err(MigrateError::TableNotFound(table.to_string()));
        }

        let rows = statistics_rows(&conn, table)?;
        let pk = catalog::primary_key_from_statistics(table, &rows);
        debug!(table, columns = ?pk.columns, "Loaded primary key");
        Ok(pk)
    }

    fn row_count_sync(&self, table: &str) -> Result<i64> {
        let conn = self.connect()?;
        let sql = format!("SELECT COUNT(*) FROM {}", quote_access(table)?);
        let rows = match conn.execute(&sql, ())? {
            Some(cursor) => text_rows(cursor, 1, 64)?,
            None => Vec::new(),
        };
        Ok(rows
            .first()
            .and_then(|r| r.first())
            .and_then(|v| v.as_ref())
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0))
    }
}

fn connect<'env>(env: &'env Environment, connection_string: &str) -> Result<Connection<'env>> {
    env.connect_with_connection_string(connection_string, ConnectionOptions::default())
        .map_err(|e| MigrateError::pool(format!("ODBC connection failed: {}", e), "Access connection"))
}

/// Index metadata for one table via `SQLStatistics`.
///
/// odbc-api has no wrapper for this catalog function, so it is called on a
/// preallocated statement and the result set is read like any other cursor.
fn statistics_rows(conn: &Connection<'_>, table: &str) -> Result<TextRows> {
    let statement = conn.preallocate()?.into_statement();
    let name = table.as_bytes();
    let name_len = i16::try_from(name.len())
        .map_err(|_| MigrateError::malformed(table, "table name too long for index lookup"))?;

    // SAFETY: the handle belongs to `statement` and `name` outlives the call.
    let ret = unsafe {
        sys::SQLStatistics(
            statement.as_sys(),
            std::ptr::null(),
            0,
            std::ptr::null(),
            0,
            name.as_ptr(),
            name_len as _,
            SQL_INDEX_ALL as _,
            SQL_QUICK as _,
        )
    };
    if ret == SqlReturn::ERROR || ret == SqlReturn::INVALID_HANDLE {
        return Err(MigrateError::Source(format!(
            "SQLStatistics failed for table {} ({:?}); cannot resolve its primary key",
            table, ret
        )));
    }

    // SAFETY: a successful catalog call leaves an open result set on the statement.
    let cursor = unsafe { CursorImpl::new(statement) };
    text_rows(cursor, 64, CATALOG_TEXT_BYTES)
}

/// Drain a cursor through a text buffer.
fn text_rows(cursor: impl Cursor, fetch_rows: usize, max_text_bytes: usize) -> Result<TextRows> {
    let mut cursor = cursor;
    let num_cols = cursor.num_result_cols()? as usize;
    let mut buffers = TextRowSet::for_cursor(fetch_rows, &mut cursor, Some(max_text_bytes))?;
    let mut row_cursor = cursor.bind_buffer(&mut buffers)?;

    let mut rows = Vec::new();
    while let Some(batch) = row_cursor.fetch_with_truncation_check(true)? {
        for row_idx in 0..batch.num_rows() {
            rows.push(
                (0..num_cols)
                    .map(|col| {
                        batch
                            .at(col, row_idx)
                            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                    })
                    .collect(),
            );
        }
    }
    Ok(rows)
}

impl From<&DataType> for ColumnKind {
    fn from(data_type: &DataType) -> Self {
        match data_type {
            DataType::Bit => ColumnKind::Bit,
            DataType::TinyInt => ColumnKind::TinyInt,
            DataType::SmallInt => ColumnKind::SmallInt,
            DataType::Integer => ColumnKind::Integer,
            DataType::BigInt => ColumnKind::BigInt,
            DataType::Real => ColumnKind::Real,
            DataType::Double | DataType::Float { .. } => ColumnKind::Double,
            DataType::Decimal { .. } | DataType::Numeric { .. } => ColumnKind::Decimal,
            DataType::Date => ColumnKind::Date,
            DataType::Time { .. } => ColumnKind::Time,
            DataType::Timestamp { .. } => ColumnKind::DateTime,
            DataType::Binary { .. }
            | DataType::Varbinary { .. }
            | DataType::LongVarbinary { .. } => ColumnKind::Binary,
            _ => ColumnKind::Text,
        }
    }
}

/// Stream `SELECT *` rows of a table into `tx`, one chunk per message.
fn stream_table(
    env: &Environment,
    connection_string: &str,
    table: &str,
    chunk_size: usize,
    fetch_rows: usize,
    max_text_bytes: usize,
    tx: &mpsc::Sender<Result<Batch>>,
) -> Result<()> {
    let conn = connect(env, connection_string)?;
    let sql = format!("SELECT * FROM {}", quote_access(table)?);
    debug!(table, sql = %sql, "Opening source cursor");

    let Some(mut cursor) = conn.execute(&sql, ())? else {
        return Ok(());
    };

    let num_cols = cursor.num_result_cols()? as u16;
    let mut names = Vec::with_capacity(num_cols as usize);
    let mut kinds = Vec::with_capacity(num_cols as usize);
    for col in 1..=num_cols {
        names.push(cursor.col_name(col)?);
        kinds.push(ColumnKind::from(&cursor.col_data_type(col)?));
    }
    let columns = Arc::new(names);

    let block_rows = fetch_rows.min(chunk_size).max(1);
    let mut buffers = TextRowSet::for_cursor(block_rows, &mut cursor, Some(max_text_bytes))?;
    let mut row_cursor = cursor.bind_buffer(&mut buffers)?;

    let mut rows: Vec<Vec<SqlValue>> = Vec::with_capacity(chunk_size);
    // Truncated memo or binary values are an error, never silently shortened
    while let Some(block) = row_cursor.fetch_with_truncation_check(true)? {
        for row_idx in 0..block.num_rows() {
            let row = kinds
                .iter()
                .enumerate()
                .map(|(col, kind)| {
                    let text = block
                        .at(col, row_idx)
                        .map(|bytes| String::from_utf8_lossy(bytes).to_string());
                    convert_text_to_sqlvalue(text, *kind)
                })
                .collect();
            rows.push(row);

            if rows.len() >= chunk_size {
                let full = std::mem::replace(&mut rows, Vec::with_capacity(chunk_size));
                if tx.blocking_send(Ok(Batch::new(Arc::clone(&columns), full))).is_err() {
                    // Receiver dropped, stop reading
                    return Ok(());
                }
            }
        }
    }

    if !rows.is_empty() {
        let _ = tx.blocking_send(Ok(Batch::new(columns, rows)));
    }
    Ok(())
}

#[async_trait]
impl SchemaIntrospector for AccessSource {
    async fn table_names(&self) -> Result<Vec<String>> {
        self.table_names_sync()
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        self.columns_sync(table)
    }

    async fn primary_key(&self, table: &str) -> Result<PrimaryKeyInfo> {
        self.primary_key_sync(table)
    }
}

#[async_trait]
impl SourceReader for AccessSource {
    fn read_table(&self, table: &str, chunk_size: usize) -> mpsc::Receiver<Result<Batch>> {
        let (tx, rx) = mpsc::channel(1);

        let env = Arc::clone(&self.env);
        let connection_string = self.connection_string.clone();
        let table = table.to_string();
        let chunk_size = chunk_size.max(1);
        let fetch_rows = self.fetch_rows;
        let max_text_bytes = self.max_text_bytes;

        tokio::task::spawn_blocking(move || {
            if let Err(e) = stream_table(
                &env,
                &connection_string,
                &table,
                chunk_size,
                fetch_rows,
                max_text_bytes,
                &tx,
            ) {
                let _ = tx.blocking_send(Err(e));
            }
        });

        rx
    }

    async fn get_row_count(&self, table: &str) -> Result<i64> {
        self.row_count_sync(table)
    }

    fn db_type(&self) -> &str {
        "access"
    }

    async fn close(&self) {
        // ODBC connections are closed when dropped
    }
}
