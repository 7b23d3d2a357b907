//! Migration orchestrator - main workflow coordinator.
//!
//! A run has three phases: translate the selected tables into one DDL script
//! (written to disk before anything executes), recreate the tables on the
//! target, then transfer each table in turn. Schema errors stop the run
//! before any DDL executes; transfer errors only fail their table.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::core::{SourceReader, TargetWriter};
use crate::error::{MigrateError, Result};
use crate::transfer::{TableTransfer, TransferConfig, TransferEngine};
use crate::translator::{DdlScript, SchemaTranslator};
use crate::typemap::TypeMap;

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
    source: Arc<dyn SourceReader>,
    target: Arc<dyn TargetWriter>,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status ("completed", "completed_with_errors" or "dry_run").
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Total tables processed.
    pub tables_total: usize,

    /// Tables successfully migrated.
    pub tables_success: usize,

    /// Tables that failed.
    pub tables_failed: usize,

    /// Total rows transferred.
    pub rows_transferred: i64,

    /// Average throughput (rows/second).
    pub rows_per_second: i64,

    /// List of failed table names.
    pub failed_tables: Vec<String>,

    /// Per-table outcomes in transfer order.
    pub tables: Vec<TableTransfer>,
}

impl MigrationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn has_failures(&self) -> bool {
        self.tables_failed > 0
    }
}

/// Source/target row count comparison for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowCountCheck {
    pub table: String,
    pub source_rows: i64,
    pub target_rows: i64,
    pub matches: bool,
}

/// Connectivity report for both databases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
    pub healthy: bool,
}

impl HealthCheckResult {
    /// Fail with a connection error unless both sides are reachable.
    pub fn ensure_healthy(&self) -> Result<()> {
        if self.healthy {
            return Ok(());
        }
        let failed: Vec<String> = [
            ("source", &self.source_error),
            ("target", &self.target_error),
        ]
        .into_iter()
        .filter_map(|(side, err)| {
            err.as_ref().map(|e| format!("{}: {}", side, e))
        })
        .collect();
        Err(MigrateError::pool(failed.join("; "), "health check"))
    }
}

/// Fail with a transfer error naming every table whose row counts differ.
pub fn ensure_row_counts_match(checks: &[RowCountCheck]) -> Result<()> {
    let mismatched: Vec<&str> = checks
        .iter()
        .filter(|c| !c.matches)
        .map(|c| c.table.as_str())
        .collect();
    if mismatched.is_empty() {
        return Ok(());
    }
    Err(MigrateError::transfer(
        mismatched.join(", "),
        format!("row counts differ for {} table(s)", mismatched.len()),
    ))
}

impl Orchestrator {
    /// Connect to the Access source and the MySQL target described by `config`.
    #[cfg(feature = "odbc")]
    pub async fn new(config: Config) -> Result<Self> {
        use crate::source::AccessSource;
        use crate::target::MysqlWriter;

        let source = AccessSource::new(&config.source).await?;
        let target = MysqlWriter::new(&config.target).await?;
        Ok(Self::with_pools(config, Arc::new(source), Arc::new(target)))
    }

    /// Connect to the Access source and the MySQL target described by `config`.
    #[cfg(not(feature = "odbc"))]
    pub async fn new(config: Config) -> Result<Self> {
        let _ = config;
        Err(MigrateError::Config(
            "reading Access databases requires building with the `odbc` feature".to_string(),
        ))
    }

    /// Build an orchestrator over existing source and target handles.
    pub fn with_pools(
        config: Config,
        source: Arc<dyn SourceReader>,
        target: Arc<dyn TargetWriter>,
    ) -> Self {
        Self {
            config,
            source,
            target,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Override the chunk size for this run.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.migration.chunk_size = chunk_size.max(1);
        self
    }

    /// Override the DDL script path for this run.
    pub fn with_ddl_script(mut self, path: impl AsRef<Path>) -> Self {
        self.config.migration.ddl_script = path.as_ref().to_path_buf();
        self
    }

    fn translator(&self) -> SchemaTranslator<dyn SourceReader> {
        SchemaTranslator::new(
            Arc::clone(&self.source),
            TypeMap::from_config(&self.config.migration),
        )
        .escape_table_names(self.config.migration.escape_table_names)
    }

    /// Source tables that pass the include/exclude filters, in source order.
    pub async fn select_tables(&self) -> Result<Vec<String>> {
        let migration = &self.config.migration;
        let all = self.source.table_names().await?;

        for wanted in &migration.include_tables {
            if !all.iter().any(|t| t.eq_ignore_ascii_case(wanted)) {
                warn!("Included table {} not found in source", wanted);
            }
        }

        let selected: Vec<String> = all
            .into_iter()
            .filter(|t| migration.includes_table(t))
            .collect();
        info!("Selected {} tables", selected.len());
        Ok(selected)
    }

    /// Translate `tables` into one DDL script.
    pub async fn generate_script(&self, tables: &[String]) -> Result<DdlScript> {
        self.translator().generate_script(tables).await
    }

    /// Translate the selected tables and write the script to `path`
    /// (the configured script path when `None`).
    pub async fn write_script(&self, path: Option<&Path>) -> Result<DdlScript> {
        let tables = self.select_tables().await?;
        let script = self.generate_script(&tables).await?;
        script.write_to(path.unwrap_or(self.config.migration.ddl_script.as_path()))?;
        Ok(script)
    }

    /// Run the migration.
    pub async fn run(&self, dry_run: bool) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting migration run: {}", run_id);

        // Phase 1: Translate schema
        info!("Phase 1: Generating DDL from source metadata");
        let tables = self.select_tables().await?;
        let script = self.generate_script(&tables).await?;
        script.write_to(&self.config.migration.ddl_script)?;

        if dry_run {
            info!("Dry run: DDL written, nothing executed");
            return Ok(self.build_result(run_id, started_at, start, tables.len(), Vec::new(), true));
        }

        // Phase 2: Recreate tables
        info!("Phase 2: Recreating {} tables on target", script.len());
        self.target.execute_ddl(&script.statements()).await?;

        // Phase 3: Transfer data
        info!("Phase 3: Transferring data");
        let engine = TransferEngine::new(
            Arc::clone(&self.source),
            Arc::clone(&self.target),
            TransferConfig::from(&self.config.migration),
        );

        let mut outcomes = Vec::with_capacity(tables.len());
        for table in &tables {
            outcomes.push(engine.import_data(table).await);
        }

        let result = self.build_result(run_id, started_at, start, tables.len(), outcomes, false);
        if result.has_failures() {
            error!(
                "Migration finished with {} failed table(s): {}",
                result.tables_failed,
                result.failed_tables.join(", ")
            );
        } else {
            info!(
                "Migration complete: {} tables, {} rows in {:.1}s",
                result.tables_total, result.rows_transferred, result.duration_seconds
            );
        }
        Ok(result)
    }

    fn build_result(
        &self,
        run_id: String,
        started_at: DateTime<Utc>,
        start: Instant,
        tables_total: usize,
        tables: Vec<TableTransfer>,
        dry_run: bool,
    ) -> MigrationResult {
        let duration_seconds = start.elapsed().as_secs_f64();
        let failed_tables: Vec<String> = tables
            .iter()
            .filter(|t| !t.is_success())
            .map(|t| t.table.clone())
            .collect();
        let rows_transferred: i64 = tables.iter().map(|t| t.rows).sum();
        let rows_per_second = if duration_seconds > 0.0 {
            (rows_transferred as f64 / duration_seconds) as i64
        } else {
            0
        };

        let status = if dry_run {
            "dry_run"
        } else if failed_tables.is_empty() {
            "completed"
        } else {
            "completed_with_errors"
        };

        MigrationResult {
            run_id,
            status: status.to_string(),
            duration_seconds,
            started_at,
            completed_at: Utc::now(),
            tables_total,
            tables_success: tables.len() - failed_tables.len(),
            tables_failed: failed_tables.len(),
            rows_transferred,
            rows_per_second,
            failed_tables,
            tables,
        }
    }

    /// Compare source and target row counts for the selected tables.
    pub async fn validate(&self) -> Result<Vec<RowCountCheck>> {
        let tables = self.select_tables().await?;
        let mut results = Vec::with_capacity(tables.len());

        for table in tables {
            let source_rows = self.source.get_row_count(&table).await?;
            let target_rows = match self.target.get_row_count(&table).await {
                Ok(count) => count,
                Err(e) => {
                    warn!("{}: cannot count target rows: {}", table, e);
                    0
                }
            };

            let matches = source_rows == target_rows;
            if matches {
                info!("{}: {} rows (match)", table, source_rows);
            } else {
                warn!(
                    "{}: source={} target={} (MISMATCH)",
                    table, source_rows, target_rows
                );
            }

            results.push(RowCountCheck {
                table,
                source_rows,
                target_rows,
                matches,
            });
        }

        Ok(results)
    }

    /// Test both connections.
    pub async fn health_check(&self) -> Result<HealthCheckResult> {
        let start = Instant::now();
        let source = self.source.table_names().await;
        let source_latency_ms = start.elapsed().as_millis() as u64;

        let start = Instant::now();
        let target = self.target.test_connection().await;
        let target_latency_ms = start.elapsed().as_millis() as u64;

        let result = HealthCheckResult {
            source_connected: source.is_ok(),
            source_latency_ms,
            source_error: source.err().map(|e| e.to_string()),
            target_connected: target.is_ok(),
            target_latency_ms,
            target_error: target.err().map(|e| e.to_string()),
            healthy: false,
        };
        Ok(HealthCheckResult {
            healthy: result.source_connected && result.target_connected,
            ..result
        })
    }

    /// Release source and target resources.
    pub async fn close(&self) {
        self.source.close().await;
        self.target.close().await;
    }
}
