//! Tracing subscriber setup.
//!
//! The filter comes from `PROCURE_LOG` when set, otherwise from the
//! configured level (`--verbose` raises it to `debug`). With a log directory
//! configured, events go to a daily rolling file so they never interleave with
//! the conversation on the terminal; otherwise they go to stderr.

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::ProcureConfig;

pub const ENV_LOG: &str = "PROCURE_LOG";

const LOG_FILE_PREFIX: &str = "procure.log";

/// Keeps the background log writer alive; drop it only at exit.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber for this process.
pub fn init(config: &ProcureConfig) -> Result<LogGuard> {
    let filter = build_filter(std::env::var(ENV_LOG).ok(), config.log_level());

    match config.log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let (writer, worker) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
            Ok(LogGuard {
                _worker: Some(worker),
            })
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
            Ok(LogGuard { _worker: None })
        }
    }
}

/// `env` wins when it parses; otherwise `level`, falling back to `warn`.
fn build_filter(env: Option<String>, level: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}
