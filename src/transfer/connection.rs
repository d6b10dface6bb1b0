//! The database connection seam.
//!
//! `Connection` is the minimal surface copybin needs from a live driver connection:
//! run a statement, prepare/deallocate a statement, and register the client-side
//! file transfer handler. Connection management itself lives outside this crate.
//!
//! [`BulkConnection`] wraps one connection together with the shared configuration
//! and the per-connection "handler attached" flag. Its transfer methods take
//! `&mut self`, so a connection can never have two transfers in flight.

use std::path::Path;
use std::sync::Arc;

use crate::config::{CopybinConfig, TransferMode};
use crate::error::{CopybinError, DriverError};

/// Result-set column metadata, as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    /// The database's type code, e.g. `int`, `varchar`, `decimal`.
    pub type_code: String,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    /// For text columns, the value size the driver observed.
    pub internal_size: Option<usize>,
}

impl ColumnDescription {
    pub fn new(name: impl Into<String>, type_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_code: type_code.into(),
            precision: None,
            scale: None,
            internal_size: None,
        }
    }
}

/// What an executed statement reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    /// Empty for statements that return no rows (such as COPY).
    pub description: Vec<ColumnDescription>,
    pub row_count: usize,
}

/// A statement prepared but not executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    pub id: u64,
    /// The declared result columns, in order.
    pub columns: Vec<ColumnDescription>,
}

pub trait Connection {
    fn execute(&mut self, sql: &str) -> Result<ResultSet, DriverError>;

    fn prepare(&mut self, sql: &str) -> Result<PreparedStatement, DriverError>;

    fn deallocate(&mut self, statement: &PreparedStatement) -> Result<(), DriverError>;

    /// Lets the server read and write files under `root` through this connection
    /// (`ON CLIENT` transfers). Paths in COPY commands are then relative to `root`.
    fn register_transfer_handler(&mut self, root: &Path) -> Result<(), DriverError>;
}

/// A connection bound to a copybin configuration.
pub struct BulkConnection<C: Connection> {
    pub(crate) conn: C,
    pub(crate) config: Arc<CopybinConfig>,
    handler_attached: bool,
}

impl<C: Connection> BulkConnection<C> {
    pub fn new(conn: C, config: Arc<CopybinConfig>) -> Result<Self, CopybinError> {
        config.validate()?;
        Ok(Self {
            conn,
            config,
            handler_attached: false,
        })
    }

    pub fn with_default_config(conn: C) -> Self {
        Self {
            conn,
            config: Arc::new(CopybinConfig::default()),
            handler_attached: false,
        }
    }

    pub fn config(&self) -> &CopybinConfig {
        &self.config
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn into_inner(self) -> C {
        self.conn
    }

    /// Registers the transfer handler for the sandbox root, once per connection.
    /// Does nothing in server mode.
    pub(crate) fn ensure_transfer_handler(&mut self) -> Result<(), CopybinError> {
        if self.handler_attached || self.config.transfer_mode != TransferMode::Client {
            return Ok(());
        }
        let root = &self.config.staging_root;
        std::fs::create_dir_all(root).map_err(|e| CopybinError::staging_io(root, e))?;
        self.conn
            .register_transfer_handler(root)
            .map_err(CopybinError::Driver)?;
        self.handler_attached = true;
        log::debug!("Registered transfer handler for {}", root.display());
        Ok(())
    }
}
