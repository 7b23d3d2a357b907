//! MySQL target writer.
//!
//! DDL, counts and health checks go through a small `mysql_async` pool. Each
//! appended chunk opens its own connection, inserts inside one transaction
//! and disconnects.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, SslOpts, TxOpts};
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::identifier::quote_mysql;
use crate::core::{Batch, SqlValue, TargetWriter};
use crate::error::{MigrateError, Result};

/// MySQL limit on placeholders per prepared statement.
const MYSQL_MAX_PLACEHOLDERS: usize = 65535;

/// MySQL target writer implementation using mysql_async.
pub struct MysqlWriter {
    opts: Opts,
    pool: Pool,
}

impl MysqlWriter {
    /// Create a new MySQL writer and verify the target is reachable.
    pub async fn new(config: &TargetConfig) -> Result<Self> {
        let ssl_opts = match config.ssl_mode.to_lowercase().as_str() {
            "disable" => {
                warn!("MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
                None
            }
            "prefer" | "require" => Some(SslOpts::default().with_danger_accept_invalid_certs(true)),
            "verify-ca" | "verify_ca" | "verify-full" | "verify_identity" => {
                Some(SslOpts::default())
            }
            _ => {
                warn!(
                    "Unknown ssl_mode '{}', defaulting to Preferred",
                    config.ssl_mode
                );
                Some(SslOpts::default().with_danger_accept_invalid_certs(true))
            }
        };

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(config.port)
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password))
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"]);

        if let Some(ssl) = ssl_opts {
            builder = builder.ssl_opts(ssl);
        }

        let constraints = PoolConstraints::new(1, 2).unwrap_or_default();
        let opts: Opts = builder
            .pool_opts(PoolOpts::new().with_constraints(constraints))
            .into();

        let writer = Self {
            pool: Pool::new(opts.clone()),
            opts,
        };
        writer.test_connection().await?;

        info!("Connected to MySQL target: {}", config.display_url());
        Ok(writer)
    }

    async fn pooled(&self, context: &str) -> Result<Conn> {
        self.pool
            .get_conn()
            .await
            .map_err(|e| MigrateError::pool(e.to_string(), context))
    }

    /// Insert rows with multi-row INSERT statements inside the caller's transaction.
    async fn insert_rows(
        tx: &mut mysql_async::Transaction<'_>,
        table: &str,
        batch: &Batch,
    ) -> Result<()> {
        let num_cols = batch.columns.len();
        if num_cols == 0 {
            return Err(MigrateError::transfer(table, "batch has no columns"));
        }

        let sql_head = insert_head(table, &batch.columns)?;
        let placeholders_per_row = format!("({})", vec!["?"; num_cols].join(", "));
        let max_rows_per_statement = (MYSQL_MAX_PLACEHOLDERS / num_cols).max(1);

        for chunk in batch.rows.chunks(max_rows_per_statement) {
            let all_placeholders: Vec<&str> = std::iter::repeat(placeholders_per_row.as_str())
                .take(chunk.len())
                .collect();
            let sql = format!("{} VALUES {}", sql_head, all_placeholders.join(", "));

            let params: Vec<mysql_async::Value> = chunk
                .iter()
                .flat_map(|row| row.iter().map(sql_value_to_mysql))
                .collect();

            tx.exec_drop(&sql, params).await?;
        }
        Ok(())
    }
}

/// `INSERT INTO `t` (`a`, `b`)` prefix for a batch.
fn insert_head(table: &str, columns: &[String]) -> Result<String> {
    let cols = columns
        .iter()
        .map(|c| quote_mysql(c))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "INSERT INTO {} ({})",
        quote_mysql(table)?,
        cols.join(", ")
    ))
}

#[async_trait]
impl TargetWriter for MysqlWriter {
    async fn execute_ddl(&self, statements: &[String]) -> Result<()> {
        let mut conn = self.pooled("executing DDL").await?;
        for stmt in statements {
            debug!("MySQL DDL: {}", stmt);
            conn.query_drop(stmt.as_str()).await?;
        }
        info!("Executed {} DDL statements", statements.len());
        Ok(())
    }

    async fn append_batch(&self, table: &str, batch: &Batch) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut conn = Conn::new(self.opts.clone())
            .await
            .map_err(|e| MigrateError::pool(e.to_string(), format!("opening connection for {}", table)))?;

        let result = async {
            let mut tx = conn.start_transaction(TxOpts::default()).await?;
            Self::insert_rows(&mut tx, table, batch).await?;
            tx.commit().await?;
            Ok::<_, MigrateError>(())
        }
        .await;

        // Uncommitted work is rolled back when the transaction is dropped
        if let Err(e) = conn.disconnect().await {
            debug!("MySQL: disconnect after append to {} failed: {}", table, e);
        }
        result?;

        debug!("MySQL: appended {} rows to {}", batch.len(), table);
        Ok(batch.len() as u64)
    }

    async fn get_row_count(&self, table: &str) -> Result<i64> {
        let mut conn = self.pooled("getting MySQL connection").await?;
        let sql = format!("SELECT COUNT(*) AS cnt FROM {}", quote_mysql(table)?);
        let count: Option<i64> = conn.query_first(&sql).await?;
        Ok(count.unwrap_or(0))
    }

    async fn test_connection(&self) -> Result<()> {
        let mut conn = self.pooled("testing MySQL connection").await?;
        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| MigrateError::pool(e.to_string(), "testing MySQL connection"))?;
        Ok(())
    }

    fn db_type(&self) -> &str {
        "mysql"
    }

    async fn close(&self) {
        self.pool.clone().disconnect().await.ok();
    }
}

fn date_value(d: NaiveDate, t: NaiveTime) -> mysql_async::Value {
    mysql_async::Value::Date(
        d.year() as u16,
        d.month() as u8,
        d.day() as u8,
        t.hour() as u8,
        t.minute() as u8,
        t.second() as u8,
        t.nanosecond() / 1_000,
    )
}

fn datetime_value(dt: &NaiveDateTime) -> mysql_async::Value {
    date_value(dt.date(), dt.time())
}

/// Convert SqlValue to mysql_async::Value.
fn sql_value_to_mysql(value: &SqlValue) -> mysql_async::Value {
    match value {
        SqlValue::Null(_) => mysql_async::Value::NULL,
        SqlValue::Bool(b) => mysql_async::Value::from(*b),
        SqlValue::I16(i) => mysql_async::Value::from(*i),
        SqlValue::I32(i) => mysql_async::Value::from(*i),
        SqlValue::I64(i) => mysql_async::Value::from(*i),
        SqlValue::F32(f) => mysql_async::Value::from(*f),
        SqlValue::F64(f) => mysql_async::Value::from(*f),
        SqlValue::Text(s) => mysql_async::Value::from(s.as_str()),
        SqlValue::Bytes(b) => mysql_async::Value::from(b.as_slice()),
        SqlValue::Decimal(d) => mysql_async::Value::from(d.to_string()),
        SqlValue::DateTime(dt) => datetime_value(dt),
        SqlValue::Date(d) => date_value(*d, NaiveTime::MIN),
        SqlValue::Time(t) => mysql_async::Value::Time(
            false,
            0,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1_000,
        ),
    }
}
