//! Schema discovery for export queries.
//!
//! Two interchangeable strategies, both preserving column order as reported:
//! - `infer`: prepare the query without running it and read the declared result
//!   columns, then deallocate the statement.
//! - `fetch`: run the query limited to a single row and read the result description.

use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::SchemaStrategy;
use crate::error::CopybinError;
use crate::transfer::connection::{ColumnDescription, Connection};
use crate::types::{wire_to_logical, FieldSpec, JsonRepr, SchemaDescriptor};

static TRAILING_LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+limit\s+\d+\s*$").expect("trailing LIMIT pattern is a valid regex")
});

/// Strips surrounding whitespace and a trailing `;` from a query.
pub fn normalize_query(query: &str) -> &str {
    query.trim().trim_end_matches(';').trim_end()
}

/// Rewrites a query so it returns at most one row, replacing any trailing LIMIT.
pub fn probe_query(query: &str) -> String {
    let query = normalize_query(query);
    format!("{} limit 1", TRAILING_LIMIT.replace(query, ""))
}

/// Discovers the result schema of `query` with the chosen strategy.
pub fn discover_schema<C: Connection>(
    conn: &mut C,
    query: &str,
    strategy: SchemaStrategy,
    json_repr: JsonRepr,
) -> Result<SchemaDescriptor, CopybinError> {
    match strategy {
        SchemaStrategy::Infer => infer_schema(conn, query, json_repr),
        SchemaStrategy::Fetch => fetch_schema(conn, query, json_repr),
    }
}

pub fn infer_schema<C: Connection>(
    conn: &mut C,
    query: &str,
    json_repr: JsonRepr,
) -> Result<SchemaDescriptor, CopybinError> {
    let start = Instant::now();
    let query = normalize_query(query);
    let statement = conn
        .prepare(query)
        .map_err(|e| CopybinError::discovery_failed(query, e))?;
    let schema = to_schema(&statement.columns, json_repr, false);

    // The statement is released on every path; a failure to do so is not fatal.
    if let Err(e) = conn.deallocate(&statement) {
        log::warn!("Failed to deallocate prepared statement {}: {}", statement.id, e);
    }

    let schema = schema?;
    log::info!(
        "Inferred schema with {} columns in {:.2} ms",
        schema.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(schema)
}

pub fn fetch_schema<C: Connection>(
    conn: &mut C,
    query: &str,
    json_repr: JsonRepr,
) -> Result<SchemaDescriptor, CopybinError> {
    let start = Instant::now();
    let probe = probe_query(query);
    let result = conn
        .execute(&probe)
        .map_err(|e| CopybinError::discovery_failed(&probe, e))?;
    let schema = to_schema(&result.description, json_repr, true)?;
    log::info!(
        "Fetched schema with {} columns in {:.2} ms",
        schema.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(schema)
}

fn to_schema(
    columns: &[ColumnDescription],
    json_repr: JsonRepr,
    with_size: bool,
) -> Result<SchemaDescriptor, CopybinError> {
    let mut schema = SchemaDescriptor::new();
    for column in columns {
        let (logical_type, mut meta) =
            wire_to_logical(&column.type_code, column.precision, column.scale, json_repr).map_err(
                |e| match e {
                    CopybinError::UnsupportedType(msg) => {
                        CopybinError::UnsupportedType(format!("column '{}': {}", column.name, msg))
                    }
                    other => other,
                },
            )?;
        // Only varchar reports a meaningful observed size.
        if with_size && column.type_code.trim().eq_ignore_ascii_case("varchar") {
            meta.size = column.internal_size.filter(|size| *size > 0);
        }
        schema.push_field(FieldSpec::new(column.name.clone(), logical_type).with_meta(meta))?;
    }
    Ok(schema)
}
