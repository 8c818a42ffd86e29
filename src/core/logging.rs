use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::config::AppPaths;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_PREFIX: &str = "adaptive-rag.log";

/// Installs stdout and daily-rolling file logging. `RUST_LOG` overrides the
/// default `info` filter.
///
/// A log directory that cannot be created only costs the file output; the
/// problem is reported once the subscriber is up.
pub fn init(paths: &AppPaths) {
    let log_dir = &paths.log_dir;
    let dir_problem = prepare_log_dir(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let first_init = LOG_GUARD.set(guard).is_ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
    {
        if first_init {
            eprintln!("Logging was not installed: {}", e);
        }
    }

    if let Some(problem) = dir_problem {
        tracing::warn!("{}; logging to stdout only", problem);
    }
}

/// Creates `dir` if needed, describing the failure when it cannot.
fn prepare_log_dir(dir: &Path) -> Option<String> {
    std::fs::create_dir_all(dir)
        .err()
        .map(|e| format!("Cannot create log directory {}: {}", dir.display(), e))
}
