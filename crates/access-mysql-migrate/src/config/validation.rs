//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};
use std::path::Path;

/// File extensions accepted for the Access source.
const ACCESS_EXTENSIONS: &[&str] = &["accdb", "mdb"];

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.r#type != "access" {
        return Err(MigrateError::Config(format!(
            "source.type must be 'access', got '{}'",
            config.source.r#type
        )));
    }
    validate_access_file(&config.source.path)?;
    if config.source.driver.is_empty() {
        return Err(MigrateError::Config("source.driver is required".into()));
    }
    if config.source.fetch_rows == 0 {
        return Err(MigrateError::Config(
            "source.fetch_rows must be at least 1".into(),
        ));
    }
    if config.source.max_text_bytes == 0 {
        return Err(MigrateError::Config(
            "source.max_text_bytes must be at least 1".into(),
        ));
    }

    // Target validation
    if config.target.r#type != "mysql" {
        return Err(MigrateError::Config(format!(
            "target.type must be 'mysql', got '{}'",
            config.target.r#type
        )));
    }
    if config.target.host.is_empty() {
        return Err(MigrateError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("target.user is required".into()));
    }

    // Migration config validation
    if config.migration.chunk_size == 0 {
        return Err(MigrateError::Config(
            "migration.chunk_size must be at least 1".into(),
        ));
    }
    if config.migration.ddl_script.as_os_str().is_empty() {
        return Err(MigrateError::Config(
            "migration.ddl_script must not be empty".into(),
        ));
    }
    if let Some((source, _)) = config
        .migration
        .type_overrides
        .iter()
        .find(|(s, t)| s.trim().is_empty() || t.trim().is_empty())
    {
        return Err(MigrateError::Config(format!(
            "migration.type_overrides has an empty entry for '{}'",
            source
        )));
    }

    Ok(())
}

/// Ensure the Access file exists and has a supported extension.
pub fn validate_access_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(MigrateError::Config(format!(
            "{} does not lead to a file",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !ACCESS_EXTENSIONS.contains(&extension.as_str()) {
        return Err(MigrateError::Config(format!(
            "{} does not lead to an .accdb or .mdb file",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, SourceConfig, TargetConfig};
    use tempfile::{Builder, NamedTempFile};

    fn access_file() -> NamedTempFile {
        Builder::new().suffix(".accdb").tempfile().unwrap()
    }

    fn valid_config(path: &Path) -> Config {
        Config {
            source: SourceConfig {
                r#type: "access".to_string(),
                path: path.to_path_buf(),
                driver: "Microsoft Access Driver (*.mdb, *.accdb)".to_string(),
                fetch_rows: 1000,
                max_text_bytes: 4096,
            },
            target: TargetConfig {
                r#type: "mysql".to_string(),
                host: "localhost".to_string(),
                port: 3306,
                database: "ipeds".to_string(),
                user: "root".to_string(),
                password: "password".to_string(),
                ssl_mode: "disable".to_string(),
            },
            migration: MigrationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let file = access_file();
        let config = valid_config(file.path());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_access_file() {
        let config = valid_config(Path::new("/definitely/not/here.accdb"));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("does not lead to a file"));
    }

    #[test]
    fn test_wrong_access_extension() {
        let file = Builder::new().suffix(".csv").tempfile().unwrap();
        let config = valid_config(file.path());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains(".accdb"));
    }

    #[test]
    fn test_mdb_extension_accepted() {
        let file = Builder::new().suffix(".MDB").tempfile().unwrap();
        assert!(validate_access_file(file.path()).is_ok());
    }

    #[test]
    fn test_wrong_source_type() {
        let file = access_file();
        let mut config = valid_config(file.path());
        config.source.r#type = "mssql".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_wrong_target_type() {
        let file = access_file();
        let mut config = valid_config(file.path());
        config.target.r#type = "postgres".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_target_host() {
        let file = access_file();
        let mut config = valid_config(file.path());
        config.target.host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_chunk_size() {
        let file = access_file();
        let mut config = valid_config(file.path());
        config.migration.chunk_size = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_empty_type_override() {
        let file = access_file();
        let mut config = valid_config(file.path());
        config
            .migration
            .type_overrides
            .insert("MEMO".into(), " ".into());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_target_config_debug_redacts_password() {
        let file = access_file();
        let mut config = valid_config(file.path());
        config.target.password = "super_secret_password_456".to_string();
        let debug_output = format!("{:?}", config.target);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_456"),
            "Debug output should not contain actual password value"
        );
    }

    #[test]
    fn test_target_config_password_not_serialized() {
        let file = access_file();
        let mut config = valid_config(file.path());
        config.target.password = "super_secret".to_string();
        let json = serde_json::to_string(&config.target).unwrap();
        assert!(
            !json.contains("super_secret"),
            "Password was serialized: {}",
            json
        );
    }
}
