//! # access-mysql-migrate
//!
//! Microsoft Access to MySQL migration library.
//!
//! This library provides:
//!
//! - **Schema translation** from Access column and primary key metadata to
//!   re-runnable MySQL DDL, with a synthetic key for keyless tables
//! - **Chunked transfer** of table contents with per-chunk transactions,
//!   bounded retries and per-table failure isolation
//! - **Type mapping** between Access and MySQL, configurable per run
//!
//! ## Example
//!
//! ```rust,no_run
//! use access_mysql_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator.run(false).await?;
//!     println!("Migrated {} rows", result.rows_transferred);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod target;
pub mod transfer;
pub mod translator;
pub mod typemap;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use crate::core::{
    Batch, ColumnDescriptor, PrimaryKeyInfo, SchemaIntrospector, SourceReader, SqlValue,
    TableDefinition, TargetWriter,
};
pub use error::{MigrateError, Result};
pub use orchestrator::{
    ensure_row_counts_match, HealthCheckResult, MigrationResult, Orchestrator, RowCountCheck,
};
pub use target::MysqlWriter;
pub use transfer::{TableState, TableTransfer, TransferConfig, TransferEngine};
pub use translator::{DdlScript, SchemaTranslator};
pub use typemap::TypeMap;

#[cfg(feature = "odbc")]
pub use source::AccessSource;
