//! Target database (MySQL) operations.

mod mysql;

pub use mysql::MysqlWriter;
