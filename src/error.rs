// In: src/error.rs

//! This module defines the single, unified error type for the entire copybin library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use std::path::PathBuf;
use thiserror::Error;

/// The error type produced by the collaborator database connection.
///
/// Drivers are free to use whatever error type they like; we only need to be able to
/// attach it as the `source` of our own errors.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide result alias.
pub type Result<T, E = CopybinError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum CopybinError {
    // =========================================================================
    // === Codec Errors
    // =========================================================================
    /// A logical type, wire type tag or decimal precision the codec cannot represent.
    #[error("Unsupported type for binary transfer: {0}")]
    UnsupportedType(String),

    /// A column file that does not match the record layout of its declared type.
    #[error("Corrupt column data: {0}")]
    CorruptData(String),

    /// A non-null value that has no representation in the wire format
    /// (e.g. it would collide with the type's null sentinel).
    #[error("Value cannot be represented in the binary format: {0}")]
    InvalidValue(String),

    // =========================================================================
    // === Transfer Protocol Errors
    // =========================================================================
    #[error("Schema discovery failed for query `{query}`: {source}")]
    SchemaDiscoveryFailed {
        query: String,
        #[source]
        source: DriverError,
    },

    #[error("Staging I/O failed at '{}': {source}", path.display())]
    StagingIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The single wire-level COPY command was rejected or aborted.
    #[error("COPY BINARY for '{target}' failed, columns: {columns}: {source}")]
    CopyFailed {
        target: String,
        /// `index: name` pairs in wire order, to make positional mismatches obvious.
        columns: String,
        #[source]
        source: DriverError,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Database command failed: {0}")]
    Driver(#[source] DriverError),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading configuration.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl CopybinError {
    /// Wraps an I/O error with the staging path it happened on.
    pub(crate) fn staging_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CopybinError::StagingIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn discovery_failed(query: &str, source: impl Into<DriverError>) -> Self {
        CopybinError::SchemaDiscoveryFailed {
            query: query.to_string(),
            source: source.into(),
        }
    }
}
