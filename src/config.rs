//! The single source of truth for all copybin transfer configuration.
//!
//! This module defines the unified `CopybinConfig` struct, which is designed to be
//! created once at the application boundary (from defaults, a JSON document, or the
//! `COPYBIN_*` environment variables) and then passed down through the system via a
//! shared, read-only `Arc<CopybinConfig>`.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CopybinError;
use crate::types::JsonRepr;

/// Prefix of every environment variable read by [`CopybinConfig::from_env`].
pub const ENV_PREFIX: &str = "COPYBIN_";

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// Which side of the connection reads and writes the staged column files.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// **Default:** Files are streamed through the client connection (`ON CLIENT`).
    /// The database only sees paths relative to the registered transfer-handler root.
    #[default]
    Client,

    /// The database process opens the files itself (`ON SERVER`). The staging root
    /// must be on a filesystem the server shares, e.g. a container mount.
    Server,
}

impl FromStr for TransferMode {
    type Err = CopybinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "server" => Ok(Self::Server),
            other => Err(CopybinError::Config(format!(
                "invalid transfer mode '{}', expected 'client' or 'server'",
                other
            ))),
        }
    }
}

/// How an export discovers its result schema when the caller does not supply one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchemaStrategy {
    /// **Default:** Prepare the query and read the result description.
    #[default]
    Infer,

    /// Run the query limited to one row and read the result description.
    Fetch,
}

impl FromStr for SchemaStrategy {
    type Err = CopybinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "infer" => Ok(Self::Infer),
            "fetch" => Ok(Self::Fetch),
            other => Err(CopybinError::Config(format!(
                "invalid schema strategy '{}', expected 'infer' or 'fetch'",
                other
            ))),
        }
    }
}

//==================================================================================
// II. The Unified CopybinConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CopybinConfig {
    #[serde(default)]
    pub transfer_mode: TransferMode,

    /// The sandbox root. Every transfer creates its own staging directory beneath it,
    /// and in client mode the transfer handler only serves files under it.
    #[serde(default = "default_staging_root")]
    pub staging_root: PathBuf,

    /// Where the database sees `staging_root`, for server mode behind a container
    /// mount. `None` means the server sees the same absolute path.
    #[serde(default)]
    pub server_staging_root: Option<PathBuf>,

    #[serde(default)]
    pub schema_strategy: SchemaStrategy,

    /// Representation for `json` columns found by schema discovery.
    #[serde(default)]
    pub json_repr: JsonRepr,

    /// If true, columns are encoded and decoded on the rayon thread pool.
    #[serde(default)]
    pub parallel_columns: bool,
}

impl Default for CopybinConfig {
    fn default() -> Self {
        Self {
            transfer_mode: TransferMode::default(),
            staging_root: default_staging_root(),
            server_staging_root: None,
            schema_strategy: SchemaStrategy::default(),
            json_repr: JsonRepr::default(),
            parallel_columns: false,
        }
    }
}

/// Helper for `serde` to provide a default for `staging_root`.
fn default_staging_root() -> PathBuf {
    env::temp_dir().join("copybin")
}

impl CopybinConfig {
    /// Parses and validates a JSON configuration document. Missing fields take
    /// their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, CopybinError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration from the process environment, starting from defaults.
    ///
    /// Recognized variables: `COPYBIN_TRANSFER_MODE`, `COPYBIN_STAGING_ROOT`,
    /// `COPYBIN_SERVER_STAGING_ROOT`, `COPYBIN_SCHEMA_STRATEGY`, `COPYBIN_JSON_REPR`
    /// and `COPYBIN_PARALLEL_COLUMNS`.
    pub fn from_env() -> Result<Self, CopybinError> {
        Self::from_lookup(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Same as [`from_env`](Self::from_env), with the variables supplied by `lookup`
    /// (keys are given without the prefix).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CopybinError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup("TRANSFER_MODE") {
            config.transfer_mode = v.parse()?;
        }
        if let Some(v) = lookup("STAGING_ROOT") {
            config.staging_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("SERVER_STAGING_ROOT") {
            config.server_staging_root = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SCHEMA_STRATEGY") {
            config.schema_strategy = v.parse()?;
        }
        if let Some(v) = lookup("JSON_REPR") {
            config.json_repr = v.parse()?;
        }
        if let Some(v) = lookup("PARALLEL_COLUMNS") {
            config.parallel_columns = parse_flag(&v)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CopybinError> {
        if self.staging_root.as_os_str().is_empty() {
            return Err(CopybinError::Config("staging_root must not be empty".to_string()));
        }
        if let Some(root) = &self.server_staging_root {
            if !root.has_root() {
                return Err(CopybinError::Config(format!(
                    "server_staging_root '{}' must be an absolute path",
                    root.display()
                )));
            }
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool, CopybinError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(CopybinError::Config(format!("invalid boolean flag '{}'", other))),
    }
}
