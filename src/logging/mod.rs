//! Application logging functionality
//!
//! Logs go to stderr and, when the config directory exists, to a daily
//! log file under ~/.config/stroketype/logs/.

use crate::core::config_file::ConfigFile;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "stroketype.log";

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    ConfigFile::logs_dir()
}

/// Get the path to the current log file
pub fn current_log_file() -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y-%m-%d");
    logs_dir().join(format!("{LOG_FILE_PREFIX}.{timestamp}"))
}

/// Filter used when RUST_LOG is unset
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "stroketype=debug"
    } else {
        "stroketype=info"
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes and stops the file writer.
pub fn init(verbose: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match file_writer() {
        Some((writer, guard)) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        ),
        None => (None, None),
    };

    if tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        // Already installed, e.g. by an embedding application
        return None;
    }

    if guard.is_some() {
        info!(
            "=== stroketype started at {} ===",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
    }
    guard
}

/// Daily rolling writer, if the config directory has been initialized
fn file_writer() -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if !ConfigFile::config_dir().exists() {
        return None;
    }
    let dir = logs_dir();
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("Failed to create logs directory {}: {}", dir.display(), e);
        return None;
    }
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Some(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_the_default_level() {
        assert_eq!(default_filter(false), "stroketype=info");
        assert_eq!(default_filter(true), "stroketype=debug");
    }

    #[test]
    fn log_file_lives_in_the_logs_directory() {
        let file = current_log_file();
        assert_eq!(file.parent(), Some(logs_dir().as_path()));
        let name = file.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("stroketype.log."));
    }
}
