//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;
pub use validation::validate_access_file;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl SourceConfig {
    /// Build an ODBC connection string for the Access driver.
    pub fn connection_string(&self) -> String {
        format!("Driver={{{}}};DBQ={};", self.driver, self.path.display())
    }
}

impl TargetConfig {
    /// Build a MySQL connection URL with the password masked.
    pub fn display_url(&self) -> String {
        format!(
            "mysql://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}
