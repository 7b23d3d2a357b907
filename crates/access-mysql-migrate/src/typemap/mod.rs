//! Type mapping between Microsoft Access and MySQL.
//!
//! A [`TypeMap`] is built once per run (defaults plus configured overrides) and
//! handed to the schema translator. It is never mutated afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::config::MigrationConfig;
use crate::core::ColumnDescriptor;
use crate::error::{MigrateError, Result};

/// Default Access → MySQL type renames. Anything else passes through.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    ("LONGCHAR", "LONGTEXT"),
    ("COUNTER", "INTEGER"),
    ("BYTE", "TINYINT UNSIGNED"),
    ("CURRENCY", "DECIMAL(19,4)"),
    ("LONGBINARY", "LONGBLOB"),
    ("GUID", "CHAR(38)"),
    ("BIT", "BOOLEAN"),
];

/// Source types whose target definition carries a size suffix by default.
const DEFAULT_VARIABLE_SIZE: &[&str] = &["VARCHAR", "CHAR", "DECIMAL", "NUMERIC", "VARBINARY", "BINARY"];

/// How a variable-size type renders its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSuffix {
    /// `(size)`
    Length,
    /// `(size,digits)`
    PrecisionScale,
}

impl SizeSuffix {
    /// Suffix rule for a source type name, if one exists.
    pub fn for_type(type_name: &str) -> Option<Self> {
        match type_name.to_ascii_uppercase().as_str() {
            "VARCHAR" | "CHAR" | "NVARCHAR" | "NCHAR" | "VARBINARY" | "BINARY" => {
                Some(SizeSuffix::Length)
            }
            "DECIMAL" | "NUMERIC" => Some(SizeSuffix::PrecisionScale),
            _ => None,
        }
    }
}

/// Immutable source → target type lookup.
#[derive(Debug, Clone)]
pub struct TypeMap {
    mappings: HashMap<String, String>,
    variable_size: BTreeSet<String>,
}

impl Default for TypeMap {
    fn default() -> Self {
        Self {
            mappings: DEFAULT_MAPPINGS
                .iter()
                .map(|(s, t)| (s.to_string(), t.to_string()))
                .collect(),
            variable_size: DEFAULT_VARIABLE_SIZE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TypeMap {
    /// Default map with overrides layered on top.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut map = Self::default();
        for (source, target) in overrides {
            map.mappings
                .insert(source.trim().to_ascii_uppercase(), target.trim().to_string());
        }
        map
    }

    /// Build the map described by the migration config.
    pub fn from_config(config: &MigrationConfig) -> Self {
        let mut map = Self::with_overrides(&config.type_overrides);
        if let Some(types) = &config.variable_size_types {
            map.variable_size = types.iter().map(|t| t.trim().to_ascii_uppercase()).collect();
        }
        map
    }

    /// Map a source type name to its target type name.
    pub fn map_type(&self, source_type: &str) -> String {
        self.mappings
            .get(&source_type.to_ascii_uppercase())
            .cloned()
            .unwrap_or_else(|| source_type.to_string())
    }

    /// Whether a source type carries a size suffix.
    pub fn is_variable_size(&self, source_type: &str) -> bool {
        self.variable_size.contains(&source_type.to_ascii_uppercase())
    }

    /// Full target type expression for a column, size suffix included.
    pub fn type_expression(&self, table: &str, column: &ColumnDescriptor) -> Result<String> {
        let base = self.map_type(&column.source_type);
        if !self.is_variable_size(&column.source_type) {
            return Ok(base);
        }
        // An override such as VARCHAR -> VARCHAR(255) fixes the size itself
        if base.contains('(') {
            debug!(
                table,
                column = %column.name,
                target = %base,
                "Mapped type is already sized, ignoring source size"
            );
            return Ok(base);
        }

        let rule = SizeSuffix::for_type(&column.source_type).ok_or_else(|| {
            MigrateError::UnsupportedType {
                table: table.to_string(),
                column: column.name.clone(),
                type_name: column.source_type.clone(),
            }
        })?;

        let size = column.size.ok_or_else(|| {
            MigrateError::malformed(
                table,
                format!(
                    "column {} of type {} has no size",
                    column.name, column.source_type
                ),
            )
        })?;

        let suffix = match rule {
            SizeSuffix::Length => format!("({})", size),
            SizeSuffix::PrecisionScale => {
                format!("({},{})", size, column.decimal_digits.unwrap_or(0))
            }
        };

        debug!(
            table,
            column = %column.name,
            before = %base,
            after = %format!("{}{}", base, suffix),
            "Applied size suffix"
        );
        Ok(format!("{}{}", base, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mappings() {
        let map = TypeMap::default();
        assert_eq!(map.map_type("LONGCHAR"), "LONGTEXT");
        assert_eq!(map.map_type("longchar"), "LONGTEXT");
        assert_eq!(map.map_type("COUNTER"), "INTEGER");
        assert_eq!(map.map_type("CURRENCY"), "DECIMAL(19,4)");
    }

    #[test]
    fn test_unknown_type_passes_through() {
        let map = TypeMap::default();
        assert_eq!(map.map_type("INTEGER"), "INTEGER");
        assert_eq!(map.map_type("DATETIME"), "DATETIME");
        assert_eq!(map.map_type("SomethingNew"), "SomethingNew");
    }

    #[test]
    fn test_overrides_replace_and_extend() {
        let mut overrides = BTreeMap::new();
        overrides.insert("longchar".to_string(), "MEDIUMTEXT".to_string());
        overrides.insert("MEMO".to_string(), "TEXT".to_string());
        let map = TypeMap::with_overrides(&overrides);

        assert_eq!(map.map_type("LONGCHAR"), "MEDIUMTEXT");
        assert_eq!(map.map_type("MEMO"), "TEXT");
        assert_eq!(map.map_type("COUNTER"), "INTEGER");
    }

    #[test]
    fn test_varchar_gets_length_suffix() {
        let map = TypeMap::default();
        let col = ColumnDescriptor::new("name", "VARCHAR").with_size(50);
        assert_eq!(map.type_expression("t", &col).unwrap(), "VARCHAR(50)");
    }

    #[test]
    fn test_decimal_gets_precision_scale_suffix() {
        let map = TypeMap::default();
        let col = ColumnDescriptor::new("amount", "DECIMAL")
            .with_size(18)
            .with_digits(4);
        assert_eq!(map.type_expression("t", &col).unwrap(), "DECIMAL(18,4)");

        let no_digits = ColumnDescriptor::new("amount", "NUMERIC").with_size(10);
        assert_eq!(map.type_expression("t", &no_digits).unwrap(), "NUMERIC(10,0)");
    }

    #[test]
    fn test_sized_override_keeps_its_own_size() {
        let mut overrides = BTreeMap::new();
        overrides.insert("VARCHAR".to_string(), "VARCHAR(255)".to_string());
        let map = TypeMap::with_overrides(&overrides);

        let col = ColumnDescriptor::new("name", "VARCHAR").with_size(50);
        assert_eq!(map.type_expression("t", &col).unwrap(), "VARCHAR(255)");

        let unsized_col = ColumnDescriptor::new("name", "VARCHAR");
        assert_eq!(map.type_expression("t", &unsized_col).unwrap(), "VARCHAR(255)");

        let other = ColumnDescriptor::new("code", "CHAR").with_size(2);
        assert_eq!(map.type_expression("t", &other).unwrap(), "CHAR(2)");
    }

    #[test]
    fn test_fixed_types_never_get_suffix() {
        let map = TypeMap::default();
        let col = ColumnDescriptor::new("id", "INTEGER").with_size(10);
        assert_eq!(map.type_expression("t", &col).unwrap(), "INTEGER");

        let memo = ColumnDescriptor::new("notes", "LONGCHAR").with_size(1_073_741_823);
        assert_eq!(map.type_expression("t", &memo).unwrap(), "LONGTEXT");
    }

    #[test]
    fn test_variable_size_without_rule_is_unsupported() {
        let config = MigrationConfig {
            variable_size_types: Some(vec!["VARCHAR".into(), "DOUBLE".into()]),
            ..Default::default()
        };
        let map = TypeMap::from_config(&config);
        let col = ColumnDescriptor::new("ratio", "DOUBLE").with_size(53);

        match map.type_expression("metrics", &col) {
            Err(MigrateError::UnsupportedType {
                table,
                column,
                type_name,
            }) => {
                assert_eq!(table, "metrics");
                assert_eq!(column, "ratio");
                assert_eq!(type_name, "DOUBLE");
            }
            other => panic!("expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_variable_size_without_size_is_malformed() {
        let map = TypeMap::default();
        let col = ColumnDescriptor::new("name", "VARCHAR");
        let err = map.type_expression("t", &col).unwrap_err();
        assert!(matches!(err, MigrateError::MalformedTable { .. }));
    }

    #[test]
    fn test_variable_size_set_can_be_replaced() {
        let config = MigrationConfig {
            variable_size_types: Some(vec!["varchar".into()]),
            ..Default::default()
        };
        let map = TypeMap::from_config(&config);
        assert!(map.is_variable_size("VARCHAR"));
        assert!(!map.is_variable_size("DECIMAL"));

        let col = ColumnDescriptor::new("amount", "DECIMAL").with_size(18);
        assert_eq!(map.type_expression("t", &col).unwrap(), "DECIMAL");
    }
}
