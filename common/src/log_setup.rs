use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides `base_level`. Console output goes to stdout, with
/// warnings and errors mirrored to stderr. When `log_dir` is given, a daily
/// rolling `haloconv.*.log` file is written there as well.
pub fn setup_logging(base_level: &str, log_dir: Option<&Path>) -> Result<()> {
    let env_filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), base_level)?;

    let console_writer = std::io::stdout.and(std::io::stderr.with_min_level(Level::WARN));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(true)
        .with_writer(console_writer);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create logs directory '{}'", dir.display())
            })?;

            let file_appender = tracing_appender::rolling::Builder::new()
                .rotation(tracing_appender::rolling::Rotation::DAILY)
                .filename_prefix("haloconv")
                .filename_suffix("log")
                .max_log_files(5)
                .build(dir)
                .context("Failed to create log file appender")?;

            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            LOG_GUARD
                .set(guard)
                .map_err(|_| anyhow!("Logging already initialized"))?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(file_writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Logger initialization failed")
}

/// Parses `from_env` when set, `base_level` otherwise.
fn build_filter(from_env: Option<String>, base_level: &str) -> Result<EnvFilter> {
    match from_env {
        Some(directives) => EnvFilter::try_new(&directives)
            .with_context(|| format!("Invalid {} filter '{}'", EnvFilter::DEFAULT_ENV, directives)),
        None => EnvFilter::try_new(base_level)
            .with_context(|| format!("Invalid log level '{}'", base_level)),
    }
}
