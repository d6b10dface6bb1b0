//! This module provides the observability hooks for copybin transfers.
//!
//! Diagnostics go through the `log` facade. The `log_metric!` macro emits one
//! structured key/value line per event at debug level, and
//! `enable_verbose_logging` installs an `env_logger` backend for applications that
//! do not configure logging themselves.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Once;

use log::LevelFilter;

use crate::error::CopybinError;

static INIT_LOGGER: Once = Once::new();

/// Logs a structured key-value metric at debug level.
///
/// # Example
/// ```ignore
/// log_metric!("event" = "export", "columns" = 3, "elapsed_ms" = 12);
/// ```
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if log::log_enabled!(log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("COPYBIN_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

/// Installs an info-level `env_logger`, once per process.
///
/// With `log_file`, output is appended to that file instead of stderr. Later calls
/// are no-ops, as is the call when another logger is already installed.
pub fn enable_verbose_logging(log_file: Option<&Path>) -> Result<(), CopybinError> {
    let target = match log_file {
        Some(path) => Some(
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .map_err(|e| CopybinError::Config(format!(
                    "cannot open log file '{}': {}",
                    path.display(),
                    e
                )))?,
        ),
        None => None,
    };

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();
        builder.is_test(false);
        builder.filter_level(LevelFilter::Info);
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())
        });
        if let Some(file) = target {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        let _ = builder.try_init();
    });
    Ok(())
}
