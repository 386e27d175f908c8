//! Logging and observability helpers.

pub mod sensitive;

pub use sensitive::{redact_credential, Sensitive};

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "assumption-gate.log";
const LOG_RETENTION_DAYS: u64 = 14;
const DEFAULT_FILTER: &str = "assumption_gate=info,assumption_gate_lib=info,sqlx=warn";

/// Installs the global tracing subscriber.
///
/// With a log directory, output goes to a daily-rolling file through a
/// non-blocking writer; the returned guard must be held for the lifetime of
/// the process so buffered lines are flushed on exit. Without one, output
/// goes to stderr.
pub fn init_tracing(log_dir: Option<&Path>, json: bool) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let guard = match log_dir {
        Some(log_dir) => {
            let _ = fs::create_dir_all(log_dir);

            // 1. Clean up old logs
            if let Err(e) = cleanup_old_logs(log_dir, LOG_RETENTION_DAYS) {
                eprintln!("Failed to clean up old logs: {}", e);
            }

            // 2. Setup file appender
            let file_appender: RollingFileAppender =
                tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            // 3. Setup subscriber
            let builder = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE);
            let _ = if json {
                builder
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .try_init()
            } else {
                builder.try_init()
            };
            Some(guard)
        }
        None => {
            let builder = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr);
            let _ = if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            None
        }
    };

    // 4. Register panic hook
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("PANIC: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("PANIC: {}", s)
        } else {
            "PANIC: unknown cause".to_string()
        };

        tracing::error!(target: "panic", location = %location, message = %msg, "Service panicked");

        previous_hook(panic_info);
    }));

    tracing::info!(log_dir = ?log_dir, "Tracing initialized");
    guard
}

fn is_log_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(LOG_FILE_PREFIX))
        .unwrap_or(false)
}

fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<usize> {
    let entries = fs::read_dir(log_dir)?;
    let now = SystemTime::now();
    let retention_duration = Duration::from_secs(retention_days * 24 * 60 * 60);
    let mut removed = 0;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if !is_log_file(&path) {
            continue;
        }

        if let Ok(metadata) = fs::metadata(&path) {
            if let Ok(modified) = metadata.modified() {
                if let Ok(age) = now.duration_since(modified) {
                    if age > retention_duration {
                        if let Err(e) = fs::remove_file(&path) {
                            eprintln!("Failed to remove old log file {:?}: {}", path, e);
                        } else {
                            removed += 1;
                        }
                    }
                }
            }
        }
    }
    Ok(removed)
}
