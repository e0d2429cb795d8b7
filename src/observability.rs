// SPDX-License-Identifier: Apache-2.0

//! Logging and observability helpers.

pub mod sensitive;

pub use sensitive::Sensitive;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "querygate.log";
const LOG_RETENTION_DAYS: u64 = 14;
const LOG_ENV_VAR: &str = "QUERYGATE_LOG";
const DEFAULT_FILTER: &str = "querygate=info,querygate_lib=info";

/// Installs the JSON tracing subscriber writing to a daily rolling file in
/// `log_dir` (or the platform data directory). Calling it twice is harmless.
pub fn init_tracing(log_dir: Option<&Path>) -> PathBuf {
    let log_dir = log_dir.map(Path::to_path_buf).unwrap_or_else(log_directory);
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory {}: {}", log_dir.display(), e);
    }

    if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS) {
        eprintln!("Failed to clean up old logs: {}", e);
    }

    let file_appender: RollingFileAppender =
        tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(file_appender)
        .json()
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    tracing::info!("Tracing initialized. Logs directory: {:?}", log_dir);
    log_dir
}

/// `QUERYGATE_LOG` first, then `RUST_LOG`, then the built-in default.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn log_directory() -> PathBuf {
    let mut path = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_default();
    path.push("querygate");
    path.push("logs");
    path
}

fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<()> {
    let now = SystemTime::now();
    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();

        let is_ours = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX));
        if !is_ours {
            continue;
        }

        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if age.is_some_and(|age| age > retention) {
            if let Err(e) = fs::remove_file(&path) {
                eprintln!("Failed to remove old log file {:?}: {}", path, e);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_keeps_fresh_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let ours = dir.path().join(format!("{LOG_FILE_PREFIX}.2026-10-19"));
        let foreign = dir.path().join("query_log.txt");
        fs::write(&ours, "{}").unwrap();
        fs::write(&foreign, "x").unwrap();

        cleanup_old_logs(dir.path(), LOG_RETENTION_DAYS).unwrap();
        assert!(ours.exists());
        assert!(foreign.exists());
    }

    #[test]
    fn zero_retention_removes_only_our_logs() {
        let dir = tempfile::tempdir().unwrap();
        let ours = dir.path().join(format!("{LOG_FILE_PREFIX}.2020-01-01"));
        let foreign = dir.path().join("query_log.txt");
        fs::write(&ours, "{}").unwrap();
        fs::write(&foreign, "x").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        cleanup_old_logs(dir.path(), 0).unwrap();
        assert!(!ours.exists());
        assert!(foreign.exists());
    }
}
