// In: src/bridge/stateless_api.rs

//! The connection-free entry points: encode a table into positional column files,
//! decode column files back into a table, and discover a query's schema.
//!
//! These are the pieces an outer SQL layer needs when it issues the COPY command
//! itself instead of going through [`BulkConnection`](crate::transfer::BulkConnection).

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;

use crate::bridge::arrow_impl;
use crate::config::SchemaStrategy;
use crate::error::CopybinError;
use crate::transfer::connection::Connection;
use crate::transfer::discovery;
use crate::transfer::orchestrator;
use crate::transfer::staging::Staging;
use crate::types::{JsonRepr, SchemaDescriptor, Table};

/// Writes each column of `table` to `dir/{index}.bin` and returns the paths in
/// column order. `dir` must exist.
pub fn encode_table(table: &Table, dir: &Path) -> Result<Vec<PathBuf>, CopybinError> {
    let files: Vec<PathBuf> = (0..table.num_columns())
        .map(|idx| dir.join(Staging::file_name(idx)))
        .collect();
    orchestrator::encode_files(table, &files, false)?;
    Ok(files)
}

/// Reads `files[i]` as the column `schema[i]` and assembles the table.
pub fn decode_files(files: &[PathBuf], schema: &SchemaDescriptor) -> Result<Table, CopybinError> {
    orchestrator::decode_files(files, schema, false)
}

/// Discovers the result schema of `query` over a bare connection.
pub fn discover_schema<C: Connection>(
    conn: &mut C,
    query: &str,
    strategy: SchemaStrategy,
    json_repr: JsonRepr,
) -> Result<SchemaDescriptor, CopybinError> {
    discovery::discover_schema(conn, query, strategy, json_repr)
}

/// [`encode_table`] for an Arrow `RecordBatch`.
pub fn encode_record_batch(batch: &RecordBatch, dir: &Path) -> Result<Vec<PathBuf>, CopybinError> {
    let table = arrow_impl::record_batch_to_table(batch)?;
    encode_table(&table, dir)
}

/// [`decode_files`] returning an Arrow `RecordBatch`.
pub fn decode_files_to_record_batch(
    files: &[PathBuf],
    schema: &SchemaDescriptor,
) -> Result<RecordBatch, CopybinError> {
    let table = decode_files(files, schema)?;
    arrow_impl::table_to_record_batch(&table)
}
