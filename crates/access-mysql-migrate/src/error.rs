//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, bad source file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source (Access/ODBC) connection or query error
    #[error("Source database error: {0}")]
    Source(String),

    /// Target (MySQL) connection or query error
    #[error("Target database error: {0}")]
    Target(#[from] mysql_async::Error),

    /// Connection error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Table does not exist in the source database
    #[error("Table not found in source: {0}")]
    TableNotFound(String),

    /// A variable-size column type has no size-suffix rule
    #[error("Unsupported type {type_name} for column {column} in table {table}")]
    UnsupportedType {
        table: String,
        column: String,
        type_name: String,
    },

    /// Source table metadata cannot produce a valid CREATE TABLE
    #[error("Malformed source table {table}: {reason}")]
    MalformedTable { table: String, reason: String },

    /// Data transfer failed for a specific table
    #[error("Transfer failed for table {table}: {message}")]
    Transfer { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "odbc")]
impl From<odbc_api::Error> for MigrateError {
    fn from(e: odbc_api::Error) -> Self {
        MigrateError::Source(e.to_string())
    }
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl Into<String>, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a Transfer error
    pub fn transfer(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Transfer {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a MalformedTable error
    pub fn malformed(table: impl Into<String>, reason: impl Into<String>) -> Self {
        MigrateError::MalformedTable {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the schema step (stops DDL generation).
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            MigrateError::TableNotFound(_)
                | MigrateError::UnsupportedType { .. }
                | MigrateError::MalformedTable { .. }
        )
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => 2,
            MigrateError::Pool { .. } | MigrateError::Source(_) | MigrateError::Target(_) => 3,
            e if e.is_schema_error() => 4,
            MigrateError::Transfer { .. } => 5,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_errors_classified() {
        assert!(MigrateError::TableNotFound("t".into()).is_schema_error());
        assert!(MigrateError::malformed("t", "no columns").is_schema_error());
        assert!(MigrateError::UnsupportedType {
            table: "t".into(),
            column: "c".into(),
            type_name: "FLOAT".into(),
        }
        .is_schema_error());
        assert!(!MigrateError::transfer("t", "boom").is_schema_error());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), 2);
        assert_eq!(MigrateError::pool("x", "y").exit_code(), 3);
        assert_eq!(MigrateError::TableNotFound("t".into()).exit_code(), 4);
        assert_eq!(MigrateError::transfer("t", "x").exit_code(), 5);
        assert_eq!(
            MigrateError::Io(std::io::Error::new(std::io::ErrorKind::Other, "x")).exit_code(),
            1
        );
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err = MigrateError::Io(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error: missing file"));
    }
}
