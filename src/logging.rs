//! File logging.
//!
//! Command output goes to the terminal, so log lines are written to a daily
//! file under the local data directory instead. `RUST_LOG` overrides the
//! filter, for example `RUST_LOG=koimeret=debug` to see each request and
//! session change.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::rolling;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "koimeret=info,warn";
const LOG_FILE_PREFIX: &str = "koimeret.log";

/// Install the global subscriber writing to [`log_directory`].
pub fn init() -> anyhow::Result<()> {
    let dir = log_directory().context("no local data directory for logs")?;
    init_in(&dir)
}

/// Install the global subscriber writing to `dir`, creating it if needed.
pub fn init_in(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let file_layer = fmt::layer()
        .with_writer(rolling::daily(dir, LOG_FILE_PREFIX))
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %dir.display(),
        "koimeret started"
    );
    Ok(())
}

/// `<data_local_dir>/koimeret/logs`, when the platform has one.
pub fn log_directory() -> Option<PathBuf> {
    dirs::data_local_dir().map(|base| base.join("koimeret").join("logs"))
}
