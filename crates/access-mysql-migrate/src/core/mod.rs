//! Core abstractions shared by the translator and the transfer engine.
//!
//! - [`schema`]: source column/key metadata and generated table definitions
//! - [`value`]: SQL values and transfer batches
//! - [`traits`]: source and target capabilities
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{ColumnDefinition, ColumnDescriptor, PrimaryKeyInfo, TableDefinition};
pub use traits::{SchemaIntrospector, SourceReader, TargetWriter};
pub use value::{Batch, SqlNullType, SqlValue};
