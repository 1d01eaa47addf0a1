//! Logging setup
//!
//! Two layers: human-readable stderr output filtered by `RUST_LOG`, and an
//! append-only error log that records every `ERROR` event with its cause chain.
//! Events sent to [`ERROR_LOG_TARGET`] reach only the error log, so failure
//! detail never shows up next to the interactive prompt.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Target for failure reports that belong in the error log only
pub const ERROR_LOG_TARGET: &str = "sql_assistant::error_log";

const VERBOSE_FILTER: &str = "sql_assistant=info";
const QUIET_FILTER: &str = "warn";

pub fn init_logging(error_log: &Path, verbose: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(error_log)
        .with_context(|| format!("Failed to open error log {}", error_log.display()))?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { QUIET_FILTER })
    });

    build_subscriber(std::io::stderr, Mutex::new(file), console_filter)?
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Console layer over `console` (with the error-log target switched off) plus
/// an `ERROR`-only layer over `error_log`.
pub fn build_subscriber<C, F>(
    console: C,
    error_log: F,
    console_filter: EnvFilter,
) -> Result<impl Subscriber + Send + Sync + 'static>
where
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let console_filter = console_filter.add_directive(
        format!("{}=off", ERROR_LOG_TARGET)
            .parse()
            .context("Invalid error log directive")?,
    );

    Ok(tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(console)
                .with_filter(console_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(error_log)
                .with_ansi(false)
                .with_timer(ChronoLocal::rfc_3339())
                .with_filter(LevelFilter::ERROR),
        ))
}
