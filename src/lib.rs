//! This file is the root of the `copybin` Rust crate.
//!
//! `copybin` reads and writes the columnar `COPY ... LITTLE ENDIAN BINARY` format:
//! one file per column, fixed- or variable-width little-endian records, nulls as
//! in-band sentinels. On top of the codecs it drives the bulk transfer itself over a
//! caller-supplied database connection.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`kernels`, `transfer`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the types most callers need.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod config;
pub mod error;
pub mod kernels;
pub mod transfer;
pub mod traits;
pub mod types;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use config::{CopybinConfig, SchemaStrategy, TransferMode};
pub use error::{CopybinError, DriverError, Result};
pub use observability::enable_verbose_logging;
pub use transfer::{BulkConnection, ColumnDescription, Connection, SchemaSource};
pub use types::{
    ColumnMeta, FieldSpec, JsonColumn, JsonRepr, LogicalType, SchemaDescriptor, Table,
    TypedColumn,
};
