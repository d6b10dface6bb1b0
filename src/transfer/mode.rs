//! Resolves staged file paths into the form the database expects for a transfer mode.
//!
//! - Server mode: an absolute path on the database host, using the configured
//!   mount point in place of the local staging root when one is set.
//! - Client mode: a path relative to the sandbox root. The remote side resolves it
//!   against the transfer handler registered on the connection.

use std::path::{Path, PathBuf};

use crate::config::TransferMode;
use crate::error::CopybinError;
use crate::transfer::staging::Staging;

impl TransferMode {
    /// The `ON ...` clause closing a COPY command.
    pub fn on_clause(&self) -> &'static str {
        match self {
            TransferMode::Client => "ON CLIENT",
            TransferMode::Server => "ON SERVER",
        }
    }
}

/// Returns the path string the database should use for a column's file.
pub fn resolve(
    mode: TransferMode,
    staging: &Staging,
    column_index: usize,
    server_root: Option<&Path>,
) -> Result<String, CopybinError> {
    let file_name = Staging::file_name(column_index);
    match mode {
        // Always '/'-separated: the remote handler interprets it, not the local OS.
        TransferMode::Client => Ok(format!("{}/{}", staging.name(), file_name)),
        TransferMode::Server => {
            let root = match server_root {
                Some(root) => root.to_path_buf(),
                None => absolute_root(staging.root())?,
            };
            let path = root.join(staging.name()).join(file_name);
            path.to_str().map(str::to_string).ok_or_else(|| {
                CopybinError::Config(format!(
                    "staging path '{}' is not valid UTF-8",
                    path.display()
                ))
            })
        }
    }
}

fn absolute_root(root: &Path) -> Result<PathBuf, CopybinError> {
    if root.has_root() {
        return Ok(root.to_path_buf());
    }
    root.canonicalize()
        .map_err(|e| CopybinError::staging_io(root, e))
}

/// Quotes a path as an SQL string literal.
pub fn quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', "''"))
}

/// Resolves and quotes the files of `count` columns, comma-separated in column order.
pub fn file_list(
    mode: TransferMode,
    staging: &Staging,
    count: usize,
    server_root: Option<&Path>,
) -> Result<String, CopybinError> {
    let quoted = (0..count)
        .map(|idx| resolve(mode, staging, idx, server_root).map(|p| quote(&p)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quoted.join(", "))
}
