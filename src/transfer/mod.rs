//! The bulk transfer protocol: staging directories, transfer modes, schema
//! discovery, and the orchestrator that drives one `COPY ... LITTLE ENDIAN BINARY`
//! command per transfer over a [`Connection`].

pub mod connection;
pub mod discovery;
pub mod mode;
pub mod orchestrator;
pub mod staging;

#[cfg(test)]
pub(crate) mod test_support;


pub use connection::{BulkConnection, ColumnDescription, Connection, PreparedStatement, ResultSet};
pub use orchestrator::SchemaSource;
pub use staging::Staging;
