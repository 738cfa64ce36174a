//! File logging
//!
//! The dashboard owns the terminal, so log output goes to a daily rolling file
//! under the platform data directory instead of stderr.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "homedash.log";

/// Directory log files are written to (`~/.local/share/homedash/logs` on Linux)
pub fn log_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "homedash").map(|dirs| dirs.data_local_dir().join("logs"))
}

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,homedash=debug"
    } else {
        "info"
    }
}

/// Installs the global subscriber writing to `logs_dir`
///
/// The returned guard flushes buffered lines when dropped and must live for
/// the rest of the program.
pub fn init_in(logs_dir: &Path, verbose: bool) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    Ok(guard)
}

/// Installs file logging in the default directory
///
/// Returns `None` (and logs nothing) if no home directory can be found or the
/// log directory cannot be created.
pub fn init(verbose: bool) -> Option<WorkerGuard> {
    let dir = log_dir()?;
    init_in(&dir, verbose).ok()
}
