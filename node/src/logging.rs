//! # Structured Logging
//!
//! Settlement logs from the vault (`cistern_protocol`), the asset token and
//! policies (`cistern_contracts`) and the runner itself (`cistern`) all go
//! through one `tracing` subscriber, configured here.
//!
//! Logs go to stderr. Stdout carries only the scenario report and the
//! metrics exposition, so `cistern run -s demo.json | jq .` keeps working
//! at any log level.

use clap::ValueEnum;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: settlements and scenario progress
/// at `info`, per-step conversions hidden.
pub const DEFAULT_FILTER: &str = "cistern=info,cistern_protocol=info,cistern_contracts=info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored output for running scenarios by hand.
    #[default]
    Pretty,
    /// One JSON object per line; settlement fields stay individually
    /// addressable (`operation`, `assets`, `shares`, ...).
    Json,
}

/// Resolves the active filter: `RUST_LOG` when set and valid, otherwise
/// `fallback`.
///
/// To trace every conversion and preview of a run:
///
/// ```text
/// RUST_LOG=cistern=info,cistern_protocol=debug cistern run -s demo.json
/// ```
pub fn resolve_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(fallback: &str, format: LogFormat) -> Result<(), TryInitError> {
    let filter = resolve_filter(fallback);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(false),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .try_init()?,
    }

    tracing::debug!(?format, "logging initialized");
    Ok(())
}
