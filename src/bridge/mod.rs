// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the public-facing boundary of the copybin library for callers that
// do not hand a connection over to `transfer::BulkConnection`. It encapsulates the
// pure, Arrow-agnostic codecs in `kernels` and the file-level plumbing of the
// transfer orchestrator.
//
// Data Flow (Import side):
//
//   1. [Caller]                     -> RecordBatch or Table
//         |
//         `-> a. `arrow_impl` converts RecordBatch -> Table
//         |
//   2. [Stateless API (encode_table)] -> one file per column, named by position
//         |
//         `-> the caller issues COPY LITTLE ENDIAN BINARY INTO ... FROM <files>
//
// Data Flow (Export side):
//
//   1. [Caller] issues COPY <query> INTO LITTLE ENDIAN BINARY <files>
//         |
//   2. [Stateless API (decode_files)] -> Table, checked for equal row counts
//         |
//         `-> b. `arrow_impl` converts Table -> RecordBatch on request
//
// ====================================================================================
pub mod arrow_impl;
pub mod stateless_api;

pub use arrow_impl::{record_batch_to_table, table_to_record_batch};
pub use stateless_api::{
    decode_files, decode_files_to_record_batch, discover_schema, encode_record_batch, encode_table,
};
