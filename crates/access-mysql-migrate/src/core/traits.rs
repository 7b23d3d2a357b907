//! Core traits for the migration engine.
//!
//! - [`SchemaIntrospector`]: table list, column metadata and primary keys
//! - [`SourceReader`]: streams table rows in chunks
//! - [`TargetWriter`]: executes DDL and appends chunks
//!
//! The translator only needs a [`SchemaIntrospector`]; the transfer engine
//! needs a [`SourceReader`] and a [`TargetWriter`]. Both are composed by the
//! orchestrator.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

use super::schema::{ColumnDescriptor, PrimaryKeyInfo};
use super::value::Batch;

/// Source metadata access.
///
/// Column introspection and primary key metadata come from different source
/// APIs; implementations hide that behind one capability.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// List user table names.
    async fn table_names(&self) -> Result<Vec<String>>;

    /// List the columns of a table in ordinal order.
    ///
    /// Returns `TableNotFound` if the table does not exist.
    async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;

    /// Get the primary key of a table (empty if none is declared).
    ///
    /// Returns `TableNotFound` if the table does not exist.
    async fn primary_key(&self, table: &str) -> Result<PrimaryKeyInfo>;
}

/// Read rows from the source database.
#[async_trait]
pub trait SourceReader: SchemaIntrospector {
    /// Start streaming every row of a table (`SELECT *`).
    ///
    /// The reader fills the returned channel from a background task. Each
    /// batch holds at most `chunk_size` rows and no empty batch is sent. The
    /// sequence is finite and cannot be restarted; an `Err` item ends it.
    fn read_table(&self, table: &str, chunk_size: usize) -> mpsc::Receiver<Result<Batch>>;

    /// Get the row count for a table.
    async fn get_row_count(&self, table: &str) -> Result<i64>;

    /// Get the database type identifier (e.g., "access").
    fn db_type(&self) -> &str;

    /// Release source resources.
    async fn close(&self);
}

/// Write schema and data to the target database.
#[async_trait]
pub trait TargetWriter: Send + Sync {
    /// Execute DDL statements in order, stopping at the first failure.
    async fn execute_ddl(&self, statements: &[String]) -> Result<()>;

    /// Append a batch to a table in a single transaction.
    ///
    /// Existing rows are never modified. On error nothing from this batch is
    /// committed. Returns the number of rows written.
    async fn append_batch(&self, table: &str, batch: &Batch) -> Result<u64>;

    /// Get the row count for a table.
    async fn get_row_count(&self, table: &str) -> Result<i64>;

    /// Check that the target is reachable.
    async fn test_connection(&self) -> Result<()>;

    /// Get the database type identifier (e.g., "mysql").
    fn db_type(&self) -> &str;

    /// Release target resources.
    async fn close(&self);
}
