//! In-memory source and target used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::{
    Batch, ColumnDescriptor, PrimaryKeyInfo, SchemaIntrospector, SourceReader, SqlValue,
    TargetWriter,
};
use crate::error::{MigrateError, Result};

pub(crate) type Row = Vec<SqlValue>;

struct MemoryTable {
    name: String,
    columns: Vec<ColumnDescriptor>,
    primary_key: PrimaryKeyInfo,
    rows: Vec<Row>,
}

/// Source holding tables in declaration order.
#[derive(Default)]
pub(crate) struct MemorySource {
    tables: Vec<MemoryTable>,
    /// Table name and 1-based chunk number at which reading fails.
    fail_read_at: Option<(String, usize)>,
}

impl MemorySource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_table(
        mut self,
        name: &str,
        columns: Vec<ColumnDescriptor>,
        primary_key: PrimaryKeyInfo,
    ) -> Self {
        self.tables.push(MemoryTable {
            name: name.to_string(),
            columns,
            primary_key,
            rows: Vec::new(),
        });
        self
    }

    /// Add a two-column (`id`, `name`) table holding `count` rows.
    pub(crate) fn with_numbered_table(self, name: &str, count: usize) -> Self {
        let rows = (1..=count)
            .map(|i| vec![SqlValue::I32(i as i32), SqlValue::Text(format!("row {}", i))])
            .collect();
        self.with_table(
            name,
            vec![
                ColumnDescriptor::new("id", "INTEGER"),
                ColumnDescriptor::new("name", "VARCHAR").with_size(255),
            ],
            PrimaryKeyInfo::new(vec!["id".into()]),
        )
        .with_rows(name, rows)
    }

    pub(crate) fn with_rows(mut self, name: &str, rows: Vec<Row>) -> Self {
        if let Some(t) = self.tables.iter_mut().find(|t| t.name == name) {
            t.rows = rows;
        }
        self
    }

    pub(crate) fn fail_read_at(mut self, table: &str, chunk: usize) -> Self {
        self.fail_read_at = Some((table.to_string(), chunk));
        self
    }

    fn table(&self, name: &str) -> Result<&MemoryTable> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| MigrateError::TableNotFound(name.to_string()))
    }
}

#[async_trait]
impl SchemaIntrospector for MemorySource {
    async fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        Ok(self.table(table)?.columns.clone())
    }

    async fn primary_key(&self, table: &str) -> Result<PrimaryKeyInfo> {
        Ok(self.table(table)?.primary_key.clone())
    }
}

#[async_trait]
impl SourceReader for MemorySource {
    fn read_table(&self, table: &str, chunk_size: usize) -> mpsc::Receiver<Result<Batch>> {
        let (tx, rx) = mpsc::channel(1);

        let prepared = self.table(table).map(|t| {
            let columns = Arc::new(t.columns.iter().map(|c| c.name.clone()).collect::<Vec<_>>());
            let chunks: Vec<Row> = t.rows.clone();
            (columns, chunks)
        });
        let fail_at = self
            .fail_read_at
            .as_ref()
            .filter(|(name, _)| name == table)
            .map(|(_, chunk)| *chunk);
        let table = table.to_string();

        tokio::spawn(async move {
            let (columns, rows) = match prepared {
                Ok(p) => p,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };
            for (idx, chunk) in rows.chunks(chunk_size.max(1)).enumerate() {
                if fail_at == Some(idx + 1) {
                    let _ = tx
                        .send(Err(MigrateError::Source(format!(
                            "cursor lost while reading {}",
                            table
                        ))))
                        .await;
                    return;
                }
                let batch = Batch::new(Arc::clone(&columns), chunk.to_vec());
                if tx.send(Ok(batch)).await.is_err() {
                    return;
                }
            }
        });

        rx
    }

    async fn get_row_count(&self, table: &str) -> Result<i64> {
        Ok(self.table(table)?.rows.len() as i64)
    }

    fn db_type(&self) -> &str {
        "memory"
    }

    async fn close(&self) {}
}

/// Target recording DDL and appended rows.
#[derive(Default)]
pub(crate) struct MemoryTarget {
    pub(crate) ddl: Mutex<Vec<String>>,
    pub(crate) rows: Mutex<HashMap<String, Vec<Row>>>,
    /// Successful append sizes per table, in order.
    pub(crate) appends: Mutex<HashMap<String, Vec<usize>>>,
    pub(crate) attempts: AtomicUsize,
    /// (table, 1-based chunk number) → remaining injected failures.
    failures: Mutex<HashMap<(String, usize), u32>>,
    fail_ddl: bool,
    unreachable: bool,
}

impl MemoryTarget {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make chunk `chunk` of `table` fail `times` times before succeeding.
    pub(crate) fn fail_chunk(self, table: &str, chunk: usize, times: u32) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert((table.to_string(), chunk), times);
        }
        self
    }

    pub(crate) fn fail_ddl(mut self) -> Self {
        self.fail_ddl = true;
        self
    }

    pub(crate) fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub(crate) fn rows_in(&self, table: &str) -> Vec<Row> {
        self.rows
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn appends_for(&self, table: &str) -> Vec<usize> {
        self.appends
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn executed_ddl(&self) -> Vec<String> {
        self.ddl.lock().unwrap().clone()
    }
}

#[async_trait]
impl TargetWriter for MemoryTarget {
    async fn execute_ddl(&self, statements: &[String]) -> Result<()> {
        if self.fail_ddl {
            return Err(MigrateError::pool("injected DDL failure", "execute_ddl"));
        }
        let mut ddl = self.ddl.lock().unwrap();
        let mut rows = self.rows.lock().unwrap();
        for stmt in statements {
            if let Some(table) = stmt.strip_prefix("CREATE TABLE ") {
                let name = table.split('(').next().unwrap_or_default();
                rows.insert(name.to_string(), Vec::new());
            }
            ddl.push(stmt.clone());
        }
        Ok(())
    }

    async fn append_batch(&self, table: &str, batch: &Batch) -> Result<u64> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let chunk = self.appends_for(table).len() + 1;
        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&(table.to_string(), chunk)) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(MigrateError::pool(
                        format!("injected failure on chunk {}", chunk),
                        format!("append_batch({})", table),
                    ));
                }
            }
        }

        self.rows
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(batch.rows.iter().cloned());
        self.appends
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(batch.len());
        Ok(batch.len() as u64)
    }

    async fn get_row_count(&self, table: &str) -> Result<i64> {
        Ok(self.rows_in(table).len() as i64)
    }

    async fn test_connection(&self) -> Result<()> {
        if self.unreachable {
            return Err(MigrateError::pool("connection refused", "test_connection"));
        }
        Ok(())
    }

    fn db_type(&self) -> &str {
        "memory"
    }

    async fn close(&self) {}
}
