use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the non-blocking writers flushing; hold it for the life of the process.
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Console logging for an agent, plus `<service>.log` under `log_dir` when that
/// directory is writable. Filter comes from `RUST_LOG` (default `info`).
pub fn init_service_logging(log_dir: &Path, service_name: &str) -> anyhow::Result<LogGuards> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (stdout_writer, stdout_guard) = non_blocking(std::io::stdout());

    if !can_write(log_dir) {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(stdout_writer)
                    .with_ansi(true)
                    .with_target(false),
            )
            .try_init()?;
        info!(
            "Logging initialized - console only ({} is not writable)",
            log_dir.display()
        );
        return Ok(LogGuards {
            _guards: vec![stdout_guard],
        });
    }

    let backup = rotate_logs_on_startup(log_dir, service_name)?;

    let (file_writer, file_guard) = non_blocking(file_appender(log_dir, service_name));
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);
    let console_layer = fmt::layer()
        .with_writer(stdout_writer)
        .with_ansi(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    info!(
        "Logging initialized - writing to {}",
        log_dir.join(log_file_name(service_name)).display()
    );
    if let Some(backup) = backup {
        info!("Previous log file backed up to: {}", backup.display());
    }
    Ok(LogGuards {
        _guards: vec![file_guard, stdout_guard],
    })
}

fn log_file_name(service_name: &str) -> String {
    format!("{service_name}.log")
}

/// One file per run; the previous run's file is moved aside by [`rotate_logs_on_startup`].
fn file_appender(log_dir: &Path, service_name: &str) -> RollingFileAppender {
    rolling::never(log_dir, log_file_name(service_name))
}

fn can_write(log_dir: &Path) -> bool {
    let probe = log_dir.join(".write_probe");
    fs::create_dir_all(log_dir)
        .and_then(|_| fs::File::create(&probe))
        .and_then(|_| fs::remove_file(&probe))
        .is_ok()
}

/// Move an existing `<service>.log` aside with a timestamp suffix.
pub fn rotate_logs_on_startup(
    log_dir: &Path,
    service_name: &str,
) -> anyhow::Result<Option<PathBuf>> {
    let log_path = log_dir.join(log_file_name(service_name));
    if !log_path.exists() {
        return Ok(None);
    }

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let backup = log_dir.join(format!("{service_name}.{timestamp}.log"));
    fs::rename(&log_path, &backup)?;
    Ok(Some(backup))
}
