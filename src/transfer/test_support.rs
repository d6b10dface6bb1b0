//! An in-process stand-in for the database side of a binary COPY.
//!
//! `MockConnection` parses the quoted file list of a COPY command, resolves
//! `ON CLIENT` paths against the registered handler root, and then writes (export)
//! or reads (import) the column files with the crate's own codecs.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DriverError;
use crate::kernels::encode_column;
use crate::transfer::connection::{ColumnDescription, Connection, PreparedStatement, ResultSet};
use crate::types::Table;

#[derive(Debug, Default)]
pub struct MockConnection {
    description: Vec<ColumnDescription>,
    export_files: Vec<Vec<u8>>,
    export_rows: usize,
    prepare_error: Option<String>,
    copy_error: Option<String>,
    handler_root: Option<PathBuf>,
    next_statement: u64,

    pub executed: Vec<String>,
    pub prepared: Vec<String>,
    pub deallocated: usize,
    pub registered_roots: Vec<PathBuf>,
    /// Local paths of the files named by the last COPY command.
    pub copy_paths: Vec<PathBuf>,
    /// File contents read by the last import COPY, in file order.
    pub imported_files: Vec<Vec<u8>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// The result columns reported by `prepare` and by probe queries.
    pub fn with_description(mut self, description: Vec<ColumnDescription>) -> Self {
        self.description = description;
        self
    }

    /// Serves `table` to export COPY commands, encoded as its own schema says.
    pub fn with_export_table(mut self, table: &Table) -> Self {
        self.export_rows = table.num_rows();
        self.export_files = table
            .schema()
            .iter()
            .zip(table.columns())
            .map(|(field, column)| encode_column(column, &field.logical_type).unwrap())
            .collect();
        self
    }

    /// Serves raw bytes to export COPY commands, one entry per file.
    pub fn with_export_files(mut self, files: Vec<Vec<u8>>) -> Self {
        self.export_files = files;
        self
    }

    pub fn failing_prepare(mut self, message: &str) -> Self {
        self.prepare_error = Some(message.to_string());
        self
    }

    pub fn failing_copy(mut self, message: &str) -> Self {
        self.copy_error = Some(message.to_string());
        self
    }

    fn resolve(&self, sql: &str, path: &str) -> Result<PathBuf, DriverError> {
        if sql.ends_with("ON CLIENT") {
            let root = self
                .handler_root
                .as_ref()
                .ok_or("ON CLIENT transfer without a registered handler")?;
            if Path::new(path).is_absolute() {
                return Err(format!("client path '{}' must be relative", path).into());
            }
            Ok(root.join(path))
        } else {
            Ok(PathBuf::from(path))
        }
    }

    fn run_copy(&mut self, sql: &str) -> Result<ResultSet, DriverError> {
        let list_start = sql.rfind("BINARY").ok_or("not a binary COPY")? + "BINARY".len();
        let list_end = sql.rfind(" ON ").ok_or("missing ON clause")?;
        let list = &sql[list_start..list_end];
        // Import commands name the table between BINARY INTO and FROM.
        let list = match list.find(" FROM ") {
            Some(idx) => &list[idx + " FROM ".len()..],
            None => list,
        };

        self.copy_paths = parse_quoted(list)?
            .iter()
            .map(|p| self.resolve(sql, p))
            .collect::<Result<_, _>>()?;

        if let Some(message) = &self.copy_error {
            return Err(message.clone().into());
        }

        if sql.starts_with("COPY LITTLE ENDIAN BINARY INTO") {
            self.imported_files = self
                .copy_paths
                .iter()
                .map(fs::read)
                .collect::<Result<_, _>>()?;
            Ok(ResultSet::default())
        } else {
            for (path, bytes) in self.copy_paths.iter().zip(&self.export_files) {
                fs::write(path, bytes)?;
            }
            Ok(ResultSet {
                description: Vec::new(),
                row_count: self.export_rows,
            })
        }
    }
}

/// Parses a comma-separated list of single-quoted SQL string literals.
fn parse_quoted(list: &str) -> Result<Vec<String>, DriverError> {
    let mut out = Vec::new();
    let mut chars = list.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            value.push('\'');
                        }
                        Some('\'') => break,
                        Some(other) => value.push(other),
                        None => return Err("unterminated string literal".into()),
                    }
                }
                out.push(value);
            }
            ',' | ' ' | '\n' | '\t' => {}
            other => return Err(format!("unexpected '{}' in file list", other).into()),
        }
    }
    Ok(out)
}

impl Connection for MockConnection {
    fn execute(&mut self, sql: &str) -> Result<ResultSet, DriverError> {
        self.executed.push(sql.to_string());
        if sql.starts_with("COPY") {
            return self.run_copy(sql);
        }
        Ok(ResultSet {
            description: self.description.clone(),
            row_count: 1,
        })
    }

    fn prepare(&mut self, sql: &str) -> Result<PreparedStatement, DriverError> {
        self.prepared.push(sql.to_string());
        if let Some(message) = &self.prepare_error {
            return Err(message.clone().into());
        }
        self.next_statement += 1;
        Ok(PreparedStatement {
            id: self.next_statement,
            columns: self.description.clone(),
        })
    }

    fn deallocate(&mut self, _statement: &PreparedStatement) -> Result<(), DriverError> {
        self.deallocated += 1;
        Ok(())
    }

    fn register_transfer_handler(&mut self, root: &Path) -> Result<(), DriverError> {
        self.registered_roots.push(root.to_path_buf());
        self.handler_root = Some(root.to_path_buf());
        Ok(())
    }
}
