//! Identifier validation and quoting.
//!
//! Identifiers (table and column names) cannot be bound as statement
//! parameters, so every name that reaches generated SQL goes through this
//! module: it is validated, then wrapped in the dialect's quoting character
//! with embedded quote characters doubled.

use crate::error::{MigrateError, Result};

/// Maximum identifier length in characters.
/// - MySQL: 64 characters
/// - Access: 64 characters
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// MySQL identifier quoting character.
pub const MYSQL_QUOTE: char = '`';

/// Validate an identifier.
///
/// Rejects empty names, names containing null bytes and names longer than
/// [`MAX_IDENTIFIER_LENGTH`] characters.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    let length = name.chars().count();
    if length > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds maximum length of {} characters (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH, length, name
        )));
    }

    Ok(())
}

/// Quote a MySQL identifier using backticks.
///
/// ```ignore
/// assert_eq!(quote_mysql("users")?, "`users`");
/// assert_eq!(quote_mysql("table`name")?, "`table``name`");
/// ```
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("{q}{}{q}", name.replace(MYSQL_QUOTE, "``"), q = MYSQL_QUOTE))
}

/// Quote an Access (Jet/ACE) identifier using brackets.
///
/// Access has no escape for `]` inside brackets, so such names are rejected.
pub fn quote_access(name: &str) -> Result<String> {
    validate_identifier(name)?;
    if name.contains(']') {
        return Err(MigrateError::Config(format!(
            "Access identifier cannot contain ']': {:?}",
            name
        )));
    }
    Ok(format!("[{}]", name))
}

/// Quote a table name only when escaping is enabled.
pub fn mysql_table_name(name: &str, escape: bool) -> Result<String> {
    if escape {
        quote_mysql(name)
    } else {
        validate_identifier(name)?;
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("HD2022").is_ok());
        assert!(validate_identifier("Field With Spaces").is_ok());
        assert!(validate_identifier("表").is_ok());
    }

    #[test]
    fn test_validate_identifier_empty() {
        let result = validate_identifier("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_identifier_null_byte() {
        let result = validate_identifier("users\0; DROP TABLE x");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_too_long() {
        let long_name = "a".repeat(65);
        let result = validate_identifier(&long_name);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("maximum length"));
    }

    #[test]
    fn test_validate_identifier_length_counts_characters() {
        assert!(validate_identifier(&"a".repeat(64)).is_ok());
        // 64 characters, 192 bytes
        assert!(validate_identifier(&"表".repeat(64)).is_ok());
        assert!(validate_identifier(&"表".repeat(65)).is_err());
    }

    #[test]
    fn test_quote_mysql() {
        assert_eq!(quote_mysql("users").unwrap(), "`users`");
        assert_eq!(quote_mysql("table`name").unwrap(), "`table``name`");
        assert_eq!(quote_mysql("a``b").unwrap(), "`a````b`");
        assert!(quote_mysql("").is_err());
    }

    #[test]
    fn test_quote_access() {
        assert_eq!(quote_access("HD 2022").unwrap(), "[HD 2022]");
        assert!(quote_access("bad]name").is_err());
    }

    #[test]
    fn test_mysql_table_name() {
        assert_eq!(mysql_table_name("students", false).unwrap(), "students");
        assert_eq!(mysql_table_name("students", true).unwrap(), "`students`");
        assert!(mysql_table_name("", false).is_err());
    }
}
