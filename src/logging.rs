//! File logging.
//!
//! The TUI owns the terminal, so logs go to `thalia.log` in the platform
//! data directory (`~/.local/share/thalia/` on Linux). `THALIA_LOG` takes
//! precedence over `RUST_LOG` for the filter.

use std::{fs, io, path::PathBuf};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter variable checked before `RUST_LOG`
pub const LOG_ENV: &str = "THALIA_LOG";

/// Path of the log file, creating its directory
pub fn log_file_path() -> Option<PathBuf> {
    let data_dir = dirs::data_local_dir()?.join("thalia");
    fs::create_dir_all(&data_dir).ok()?;
    Some(data_dir.join("thalia.log"))
}

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default))
}

/// Send log records to the log file.
///
/// Failure leaves the app running without logs.
pub fn init() -> io::Result<()> {
    let log_path = log_file_path().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Could not determine log directory")
    })?;

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter("info"))
        .with(file_layer)
        .init();

    tracing::info!(path = %log_path.display(), "Logging initialized");
    Ok(())
}

/// Log warnings to stderr, for the non-interactive subcommands
pub fn init_stderr() {
    let _ = tracing_subscriber::registry()
        .with(filter("warn"))
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init();
}
