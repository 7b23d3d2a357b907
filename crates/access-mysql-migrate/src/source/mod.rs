//! Source database (Microsoft Access) access.

#[cfg(feature = "odbc")]
mod access;
pub mod catalog;
mod types;

#[cfg(feature = "odbc")]
pub use access::AccessSource;
pub use types::{convert_text_to_sqlvalue, ColumnKind};
