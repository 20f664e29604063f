#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Logging setup and helpers for the generation pipeline.
//!
//! Diagnostics go through `tracing`. Binaries call [`init`] once at startup;
//! library code only emits events.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV_VAR: &str = "PRISMANY_LOG";

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The configured level is not a valid filter directive.
    #[error("Invalid log level '{level}': {message}")]
    InvalidLevel {
        /// Level string as configured
        level: String,
        /// Parser message
        message: String,
    },
    /// The log file could not be opened for appending.
    #[error("Failed to open log file {}: {source}", path.display())]
    File {
        /// Log file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// A global subscriber is already installed.
    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Build the filter for `level`, letting [`LOG_ENV_VAR`] take precedence.
pub fn filter_for(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(from_env) = std::env::var(LOG_ENV_VAR) {
        if let Ok(filter) = EnvFilter::try_new(&from_env) {
            return Ok(filter);
        }
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidLevel {
        level: level.to_string(),
        message: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// Events are written to stderr, or appended to `file` without ANSI colors
/// when one is given.
pub fn init(level: &str, file: Option<&Path>) -> Result<(), LoggingError> {
    let filter = filter_for(level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = match file {
        Some(path) => {
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::File { path: path.to_path_buf(), source })?;
            builder.with_ansi(false).with_writer(Mutex::new(log_file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|_| LoggingError::AlreadyInitialized)
}

/// Emits a trace event tagged with the pipeline stage it came from.
pub fn trace(module: &str, msg: &str) {
    tracing::trace!(module = module, "{}", msg);
}
