//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (Microsoft Access).
    pub source: SourceConfig,

    /// Target database configuration (MySQL).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source database (Microsoft Access) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database type (always "access").
    #[serde(default = "default_access")]
    pub r#type: String,

    /// Path to the .accdb / .mdb file.
    pub path: PathBuf,

    /// ODBC driver name.
    #[serde(default = "default_access_driver")]
    pub driver: String,

    /// Rows fetched per ODBC block.
    #[serde(default = "default_fetch_rows")]
    pub fetch_rows: usize,

    /// Maximum bytes buffered per text value.
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,
}

/// Target database (MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database type (always "mysql").
    #[serde(default = "default_mysql")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// SSL mode (default: "disable").
    #[serde(default = "default_disable")]
    pub ssl_mode: String,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Rows per transfer chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Extra attempts for a failed chunk append before the table fails.
    #[serde(default = "default_chunk_retries")]
    pub chunk_retries: u32,

    /// Base delay between chunk retries in milliseconds (multiplied by attempt).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Path of the combined DDL script written on every run.
    #[serde(default = "default_ddl_script")]
    pub ddl_script: PathBuf,

    /// Tables to include (case-insensitive names). Empty means all.
    #[serde(default)]
    pub include_tables: Vec<String>,

    /// Tables to exclude (case-insensitive names).
    #[serde(default)]
    pub exclude_tables: Vec<String>,

    /// Quote table names in the generated DDL script.
    ///
    /// Transfer INSERT statements always quote table and column names.
    #[serde(default)]
    pub escape_table_names: bool,

    /// Additional or replacement source → target type mappings.
    #[serde(default)]
    pub type_overrides: BTreeMap<String, String>,

    /// Replaces the default set of types that carry a size suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_size_types: Option<Vec<String>>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_retries: default_chunk_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            ddl_script: default_ddl_script(),
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
            escape_table_names: false,
            type_overrides: BTreeMap::new(),
            variable_size_types: None,
        }
    }
}

impl MigrationConfig {
    /// Whether a source table passes the include/exclude filters.
    pub fn includes_table(&self, table: &str) -> bool {
        let listed = |names: &[String]| names.iter().any(|n| n.eq_ignore_ascii_case(table));

        if !self.include_tables.is_empty() && !listed(&self.include_tables) {
            return false;
        }
        !listed(&self.exclude_tables)
    }
}

// Default value functions for serde
fn default_access() -> String {
    "access".to_string()
}

fn default_mysql() -> String {
    "mysql".to_string()
}

fn default_access_driver() -> String {
    "Microsoft Access Driver (*.mdb, *.accdb)".to_string()
}

fn default_fetch_rows() -> usize {
    1_000
}

fn default_max_text_bytes() -> usize {
    65_536
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_disable() -> String {
    "disable".to_string()
}

fn default_chunk_size() -> usize {
    10_000
}

fn default_chunk_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_ddl_script() -> PathBuf {
    PathBuf::from("ipeds_table_creation.sql")
}
