//! The bulk transfer orchestrator.
//!
//! Export: resolve schema -> open staging -> `COPY <query> INTO LITTLE ENDIAN BINARY`
//! -> decode each file into a column -> close staging -> assemble the table.
//!
//! Import: open staging -> encode each column into its file ->
//! `COPY LITTLE ENDIAN BINARY INTO <table> FROM` -> close staging.
//!
//! Staging is closed on every path. A failure to clean up is logged and never
//! replaces the error that ended the transfer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use crate::config::SchemaStrategy;
use crate::error::CopybinError;
use crate::kernels::{decode_column, encode_column};
use crate::transfer::connection::{BulkConnection, Connection};
use crate::transfer::discovery::{self, normalize_query};
use crate::transfer::mode;
use crate::transfer::staging::Staging;
use crate::types::{SchemaDescriptor, Table, TypedColumn};

/// Where an export gets its result schema from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SchemaSource {
    /// Supplied by the caller, in the query's result column order.
    Explicit(SchemaDescriptor),
    /// Prepare the query and read the declared result columns.
    Infer,
    /// Run the query for one row and read the result description.
    Fetch,
    /// Whichever strategy the configuration selects.
    #[default]
    Default,
}

impl From<SchemaDescriptor> for SchemaSource {
    fn from(schema: SchemaDescriptor) -> Self {
        SchemaSource::Explicit(schema)
    }
}

impl From<SchemaStrategy> for SchemaSource {
    fn from(strategy: SchemaStrategy) -> Self {
        match strategy {
            SchemaStrategy::Infer => SchemaSource::Infer,
            SchemaStrategy::Fetch => SchemaSource::Fetch,
        }
    }
}

//==================================================================================
// 1. Connection-level Transfers
//==================================================================================

impl<C: Connection> BulkConnection<C> {
    /// Discovers the result schema of `query` with the given strategy.
    pub fn discover_schema(
        &mut self,
        query: &str,
        strategy: SchemaStrategy,
    ) -> Result<SchemaDescriptor, CopybinError> {
        let json_repr = self.config.json_repr;
        discovery::discover_schema(&mut self.conn, query, strategy, json_repr)
    }

    /// Runs `query` and returns its result set, transferred as binary column files.
    pub fn export(&mut self, query: &str, source: SchemaSource) -> Result<Table, CopybinError> {
        let start = Instant::now();
        let query = normalize_query(query);
        let schema = match source {
            SchemaSource::Explicit(schema) => schema,
            SchemaSource::Infer => self.discover_schema(query, SchemaStrategy::Infer)?,
            SchemaSource::Fetch => self.discover_schema(query, SchemaStrategy::Fetch)?,
            SchemaSource::Default => {
                let strategy = self.config.schema_strategy;
                self.discover_schema(query, strategy)?
            }
        };
        require_columns(&schema, query)?;

        self.ensure_transfer_handler()?;
        let staging = Staging::open(&self.config.staging_root)?;
        let result = self.run_export(query, &schema, &staging);
        close_staging(staging);

        let table = result?;
        log::info!(
            "Exported {} rows x {} columns in {:.2} ms",
            table.num_rows(),
            table.num_columns(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        log_metric!("event" = "export", "rows" = table.num_rows(), "columns" = table.num_columns());
        Ok(table)
    }

    /// Appends the rows of `table` to the database table `target`.
    ///
    /// Columns are bound by position: column `i` of `table` goes to column `i` of
    /// `target`, whatever the names.
    pub fn import(&mut self, table: &Table, target: &str) -> Result<(), CopybinError> {
        let start = Instant::now();
        require_columns(table.schema(), target)?;

        self.ensure_transfer_handler()?;
        let staging = Staging::open(&self.config.staging_root)?;
        let result = self.run_import(table, target, &staging);
        close_staging(staging);

        result?;
        log::info!(
            "Imported {} rows x {} columns into '{}' in {:.2} ms",
            table.num_rows(),
            table.num_columns(),
            target,
            start.elapsed().as_secs_f64() * 1000.0
        );
        log_metric!("event" = "import", "rows" = table.num_rows(), "columns" = table.num_columns());
        Ok(())
    }

    fn run_export(
        &mut self,
        query: &str,
        schema: &SchemaDescriptor,
        staging: &Staging,
    ) -> Result<Table, CopybinError> {
        let files = self.file_list(staging, schema.len())?;
        let sql = format!(
            "COPY {} INTO LITTLE ENDIAN BINARY {} {}",
            query,
            files,
            self.config.transfer_mode.on_clause()
        );
        self.execute_copy(&sql, query, schema)?;
        decode_files(&staging.files(schema.len()), schema, self.config.parallel_columns)
    }

    fn run_import(
        &mut self,
        table: &Table,
        target: &str,
        staging: &Staging,
    ) -> Result<(), CopybinError> {
        let paths = staging.files(table.num_columns());
        encode_files(table, &paths, self.config.parallel_columns)?;
        let files = self.file_list(staging, table.num_columns())?;
        let sql = format!(
            "COPY LITTLE ENDIAN BINARY INTO {} FROM {} {}",
            target,
            files,
            self.config.transfer_mode.on_clause()
        );
        self.execute_copy(&sql, target, table.schema())?;
        Ok(())
    }

    fn file_list(&self, staging: &Staging, count: usize) -> Result<String, CopybinError> {
        mode::file_list(
            self.config.transfer_mode,
            staging,
            count,
            self.config.server_staging_root.as_deref(),
        )
    }

    fn execute_copy(
        &mut self,
        sql: &str,
        target: &str,
        schema: &SchemaDescriptor,
    ) -> Result<(), CopybinError> {
        log::debug!("Executing: {}", sql);
        self.conn.execute(sql).map_err(|source| {
            log::error!("COPY BINARY for '{}' failed: {}", target, source);
            CopybinError::CopyFailed {
                target: target.to_string(),
                columns: schema.describe_positions(),
                source,
            }
        })?;
        Ok(())
    }
}

fn require_columns(schema: &SchemaDescriptor, what: &str) -> Result<(), CopybinError> {
    if schema.is_empty() {
        return Err(CopybinError::SchemaMismatch(format!(
            "binary transfer for '{}' needs at least one column",
            what
        )));
    }
    Ok(())
}

fn close_staging(staging: Staging) {
    if let Err(e) = staging.close() {
        log::warn!("Failed to clean up staging directory: {}", e);
    }
}

//==================================================================================
// 2. File-level Encode / Decode
//==================================================================================

/// Writes each column of `table` to the file at the same position in `paths`.
pub fn encode_files(table: &Table, paths: &[PathBuf], parallel: bool) -> Result<(), CopybinError> {
    if paths.len() != table.num_columns() {
        return Err(CopybinError::InternalError(format!(
            "{} files for {} columns",
            paths.len(),
            table.num_columns()
        )));
    }
    let write_one = |(idx, path): (usize, &PathBuf)| -> Result<(), CopybinError> {
        let field = &table.schema().fields()[idx];
        let bytes = encode_column(&table.columns()[idx], &field.logical_type).map_err(|e| {
            log::error!("Failed to encode column {} ('{}'): {}", idx, field.name, e);
            e
        })?;
        fs::write(path, bytes).map_err(|e| CopybinError::staging_io(path, e))
    };

    if parallel {
        paths.par_iter().enumerate().try_for_each(write_one)
    } else {
        paths.iter().enumerate().try_for_each(write_one)
    }
}

/// Reads the file at each position of `paths` as the field at the same position of
/// `schema`, and checks that every column has the same number of rows.
pub fn decode_files(
    paths: &[PathBuf],
    schema: &SchemaDescriptor,
    parallel: bool,
) -> Result<Table, CopybinError> {
    if paths.len() != schema.len() {
        return Err(CopybinError::SchemaMismatch(format!(
            "{} files for a {}-column schema",
            paths.len(),
            schema.len()
        )));
    }
    let read_one = |(idx, path): (usize, &PathBuf)| -> Result<TypedColumn, CopybinError> {
        let field = &schema.fields()[idx];
        let bytes = read_column_file(path)?;
        decode_column(&bytes, field).map_err(|e| {
            log::error!("Failed to decode column {} ('{}'): {}", idx, field.name, e);
            e
        })
    };

    let columns = if parallel {
        paths.par_iter().enumerate().map(read_one).collect::<Result<Vec<_>, _>>()?
    } else {
        paths.iter().enumerate().map(read_one).collect::<Result<Vec<_>, _>>()?
    };

    if let Some(first) = columns.first() {
        let expected = first.len();
        if let Some((idx, column)) = columns.iter().enumerate().find(|(_, c)| c.len() != expected) {
            return Err(CopybinError::CorruptData(format!(
                "column {} decoded {} rows but column 0 decoded {}",
                idx,
                column.len(),
                expected
            )));
        }
    }
    Table::try_new(schema.clone(), columns)
}

fn read_column_file(path: &Path) -> Result<Vec<u8>, CopybinError> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CopybinError::CorruptData(format!(
            "column file '{}' was not produced",
            path.display()
        )),
        _ => CopybinError::staging_io(path, e),
    })
}
