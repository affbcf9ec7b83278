//! Logging configuration using the tracing ecosystem.
//!
//! Logs go to stderr so that stdout carries only the report. The level is
//! taken from `RUST_LOG` when set, otherwise from the `--verbose` flag.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log filter if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "tapd_report=warn";

/// Log filter used with `--verbose`.
const VERBOSE_LOG_FILTER: &str = "tapd_report=debug,warn";

/// Initialize the logging system.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true)
                .with_file(verbose)
                .with_line_number(verbose),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "tapd-report starting up");
    Ok(())
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    }
}
