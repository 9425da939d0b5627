//! Structured logging setup.
//!
//! powermon logs through `tracing`.  The subscriber is installed once by the
//! binary:
//!
//! - default level is `warn`, or `info` with `--verbose`;
//! - `RUST_LOG` overrides both (e.g. `RUST_LOG=powermon_server=debug`);
//! - with `--logfile` output is appended to that file, without ANSI colours,
//!   instead of going to stdout.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Error type for logging initialisation.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be opened for appending.
    #[error("failed to open log file {path}: {source}")]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A global subscriber was already installed.
    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Returns the filter directive used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "info"
    } else {
        "warn"
    }
}

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns [`LoggingError::OpenLogFile`] if `logfile` cannot be opened and
/// [`LoggingError::Init`] if a subscriber is already installed.
pub fn init(verbose: bool, logfile: Option<&Path>) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::OpenLogFile {
                    path: path.to_path_buf(),
                    source,
                })?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.try_init(),
    };
    result.map_err(|e| LoggingError::Init(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
