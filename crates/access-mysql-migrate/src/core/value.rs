//! SQL value types for row transfer.
//!
//! Values read from the source are converted into [`SqlValue`]s, grouped into
//! [`Batch`]es of at most one chunk, and bound as parameters on the target.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

/// Type hint carried by NULL values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlNullType {
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
    Decimal,
    DateTime,
    Date,
    Time,
}

/// SQL value carried from the source row to the target parameter list.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL with type hint.
    Null(SqlNullType),

    Bool(bool),

    /// 16-bit signed integer (Access BYTE and INTEGER).
    I16(i16),

    /// 32-bit signed integer (Access LONG and COUNTER).
    I32(i32),

    I64(i64),

    /// Single precision float (Access SINGLE).
    F32(f32),

    /// Double precision float (Access DOUBLE).
    F64(f64),

    Text(String),

    Bytes(Vec<u8>),

    /// Exact numeric (Access DECIMAL and CURRENCY).
    Decimal(Decimal),

    DateTime(NaiveDateTime),

    Date(NaiveDate),

    Time(NaiveTime),
}

/// One transfer chunk: a bounded set of rows plus the column names they follow.
///
/// Columns are shared between all batches of a table.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Source column names in `SELECT *` order.
    pub columns: Arc<Vec<String>>,

    /// Rows in this batch (owned for channel transfer).
    pub rows: Vec<Vec<SqlValue>>,
}

impl Batch {
    pub fn new(columns: Arc<Vec<String>>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
