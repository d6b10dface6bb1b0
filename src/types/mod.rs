//! This module defines the core, strongly-typed data representations used
//! throughout copybin.
//!
//! It includes the `LogicalType` enum, the type mapping table to and from the
//! database's wire type tags, the ordered `SchemaDescriptor`, and the in-memory
//! `TypedColumn`/`Table` containers the codecs read from and write into.

pub mod column;
pub mod logical_type;
pub mod schema;
pub mod wire_type;

// Re-export the main type(s) for easier access.
pub use column::{JsonColumn, Table, TypedColumn};
pub use logical_type::{DecimalWidth, JsonRepr, LogicalType, RecordShape};
pub use schema::{ColumnMeta, FieldSpec, SchemaDescriptor};
pub use wire_type::{logical_to_wire, wire_to_logical};
