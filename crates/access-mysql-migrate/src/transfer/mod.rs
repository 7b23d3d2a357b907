//! Chunked data transfer engine.
//!
//! Each table is streamed from the source in chunks of at most `chunk_size`
//! rows. Every chunk is appended to the target in its own transaction; a
//! failed append is retried a bounded number of times. Any error after that
//! fails the table but never the run: rows already committed stay in place
//! and the caller moves on to the next table.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::MigrationConfig;
use crate::core::{Batch, SourceReader, TargetWriter};
use crate::error::{MigrateError, Result};

/// Transfer state of a single table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableState {
    NotStarted,
    Streaming,
    Completed,
    Failed,
}

/// Outcome of transferring one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableTransfer {
    pub table: String,
    pub state: TableState,
    /// Rows committed to the target.
    pub rows: i64,
    /// Chunks committed to the target.
    pub chunks: usize,
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableTransfer {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            state: TableState::NotStarted,
            rows: 0,
            chunks: 0,
            duration_seconds: 0.0,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == TableState::Completed
    }
}

/// Transfer engine configuration.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Maximum rows per chunk.
    pub chunk_size: usize,
    /// Extra attempts per failed chunk append.
    pub chunk_retries: u32,
    /// Delay before the first retry; later retries wait proportionally longer.
    pub retry_backoff: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            chunk_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl From<&MigrationConfig> for TransferConfig {
    fn from(config: &MigrationConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            chunk_retries: config.chunk_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// Moves table contents from source to target.
pub struct TransferEngine {
    source: Arc<dyn SourceReader>,
    target: Arc<dyn TargetWriter>,
    config: TransferConfig,
}

impl TransferEngine {
    pub fn new(
        source: Arc<dyn SourceReader>,
        target: Arc<dyn TargetWriter>,
        config: TransferConfig,
    ) -> Self {
        Self {
            source,
            target,
            config,
        }
    }

    /// Copy every row of `table` to the target.
    ///
    /// Errors are absorbed into the returned outcome.
    pub async fn import_data(&self, table: &str) -> TableTransfer {
        let start = Instant::now();
        let mut outcome = TableTransfer::new(table);

        outcome.state = TableState::Streaming;
        let result = self.stream_table(table, &mut outcome).await;
        outcome.duration_seconds = start.elapsed().as_secs_f64();

        match result {
            Ok(()) => {
                outcome.state = TableState::Completed;
                info!(
                    table,
                    rows = outcome.rows,
                    chunks = outcome.chunks,
                    duration_seconds = outcome.duration_seconds,
                    "Successfully imported table"
                );
            }
            Err(e) => {
                outcome.state = TableState::Failed;
                error!(
                    table,
                    rows = outcome.rows,
                    chunks = outcome.chunks,
                    "Failed to import table\n{}",
                    e.format_detailed()
                );
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }

    async fn stream_table(&self, table: &str, outcome: &mut TableTransfer) -> Result<()> {
        let mut rx = self.source.read_table(table, self.config.chunk_size);
        debug!(table, chunk_size = self.config.chunk_size, "Opened source stream");

        while let Some(next) = rx.recv().await {
            let batch = next?;
            if batch.is_empty() {
                continue;
            }
            let chunk = outcome.chunks + 1;
            let written = self.append_with_retry(table, &batch, chunk).await?;

            outcome.chunks = chunk;
            outcome.rows += written as i64;
            info!(table, chunk, rows = written, total_rows = outcome.rows, "Transferred chunk");
        }

        // Dropping the receiver releases the source cursor
        drop(rx);
        Ok(())
    }

    async fn append_with_retry(&self, table: &str, batch: &Batch, chunk: usize) -> Result<u64> {
        let mut attempt: u32 = 0;
        loop {
            match self.target.append_batch(table, batch).await {
                Ok(written) => return Ok(written),
                Err(e) if attempt < self.config.chunk_retries => {
                    attempt += 1;
                    let delay = self.config.retry_backoff * attempt;
                    warn!(
                        table,
                        chunk,
                        attempt,
                        max_retries = self.config.chunk_retries,
                        "Chunk append failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(MigrateError::transfer(
                        table,
                        format!(
                            "chunk {} failed after {} attempt(s): {}",
                            chunk,
                            attempt + 1,
                            e
                        ),
                    ))
                }
            }
        }
    }
}
