//! Conversion of ODBC text values into typed SQL values.
//!
//! The Access reader fetches every column through a text buffer; each value
//! is then parsed according to the column's [`ColumnKind`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::core::{SqlNullType, SqlValue};

/// Value category of a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Bit,
    /// Unsigned byte (Access BYTE).
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    /// Exact numerics including CURRENCY.
    Decimal,
    Date,
    Time,
    DateTime,
    Binary,
    Text,
}

impl ColumnKind {
    /// NULL type hint for this kind.
    pub fn null_type(self) -> SqlNullType {
        match self {
            ColumnKind::Bit => SqlNullType::Bool,
            ColumnKind::TinyInt | ColumnKind::SmallInt => SqlNullType::I16,
            ColumnKind::Integer => SqlNullType::I32,
            ColumnKind::BigInt => SqlNullType::I64,
            ColumnKind::Real => SqlNullType::F32,
            ColumnKind::Double => SqlNullType::F64,
            ColumnKind::Decimal => SqlNullType::Decimal,
            ColumnKind::Date => SqlNullType::Date,
            ColumnKind::Time => SqlNullType::Time,
            ColumnKind::DateTime => SqlNullType::DateTime,
            ColumnKind::Binary => SqlNullType::Bytes,
            ColumnKind::Text => SqlNullType::String,
        }
    }
}

/// Convert a text value from ODBC to a [`SqlValue`] for the given column kind.
///
/// Values that fail to parse become typed NULLs, except binary and text which
/// always keep their content.
pub fn convert_text_to_sqlvalue(text: Option<String>, kind: ColumnKind) -> SqlValue {
    let Some(s) = text else {
        return SqlValue::Null(kind.null_type());
    };
    let null = SqlValue::Null(kind.null_type());

    match kind {
        // Access stores Yes as -1
        ColumnKind::Bit => match s.trim() {
            "1" | "-1" | "true" | "True" | "TRUE" => SqlValue::Bool(true),
            "0" | "false" | "False" | "FALSE" => SqlValue::Bool(false),
            other => other.parse().map(SqlValue::Bool).unwrap_or(null),
        },
        ColumnKind::TinyInt => s
            .trim()
            .parse::<u8>()
            .map(|v| SqlValue::I16(v as i16))
            .unwrap_or(null),
        ColumnKind::SmallInt => s.trim().parse::<i16>().map(SqlValue::I16).unwrap_or(null),
        ColumnKind::Integer => s.trim().parse::<i32>().map(SqlValue::I32).unwrap_or(null),
        ColumnKind::BigInt => s.trim().parse::<i64>().map(SqlValue::I64).unwrap_or(null),
        ColumnKind::Real => s.trim().parse::<f32>().map(SqlValue::F32).unwrap_or(null),
        ColumnKind::Double => s.trim().parse::<f64>().map(SqlValue::F64).unwrap_or(null),
        ColumnKind::Decimal => {
            // Currency values may carry symbols and grouping separators
            let cleaned = s.trim().replace(['$', ','], "");
            Decimal::from_str_exact(&cleaned)
                .or_else(|_| cleaned.parse::<Decimal>())
                .map(SqlValue::Decimal)
                .unwrap_or(null)
        }
        ColumnKind::DateTime => parse_datetime(&s).map(SqlValue::DateTime).unwrap_or(null),
        ColumnKind::Date => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .or_else(|| parse_datetime(&s).map(|dt| dt.date()))
            .map(SqlValue::Date)
            .unwrap_or(null),
        ColumnKind::Time => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
            .map(SqlValue::Time)
            .unwrap_or(null),
        ColumnKind::Binary => {
            // ODBC returns binary as hex, with or without a 0x prefix
            let hex_str = s
                .strip_prefix("0x")
                .or_else(|| s.strip_prefix("0X"))
                .unwrap_or(&s);
            hex::decode(hex_str)
                .map(SqlValue::Bytes)
                .unwrap_or_else(|_| SqlValue::Bytes(s.into_bytes()))
        }
        ColumnKind::Text => SqlValue::Text(s),
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
