//! Structured logging for `cmdportd` and embedding applications.
//!
//! Events carry per-module targets (`cmdport::registry`, `cmdport::dispatch`,
//! `cmdport::transport`, `cmdport::daemon`) and the name of the emitting
//! thread, which identifies the session (`cmdport-session-<n>`) or the
//! accept loop (`cmdport-accept`).

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, info, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use cmdport_config::{Config, LogFormat};

const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Proof that the process-wide subscriber is in place.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by the call that installed the subscriber.
    #[must_use]
    pub fn format(&self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid filter directive.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Some other subscriber already owns the process.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Routes `tracing` events to stderr according to `config`.
///
/// Only the first successful call installs a subscriber. Later calls keep
/// it and report the format it was installed with.
///
/// # Errors
///
/// Returns [`TelemetryError`] when `log_filter` does not parse or another
/// subscriber was installed outside this module.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            install_subscriber(config)?;
            info!(
                target: TELEMETRY_TARGET,
                version = env!("CARGO_PKG_VERSION"),
                filter = config.log_filter(),
                format = %config.log_format(),
                "telemetry ready"
            );
            Ok(config.log_format())
        })
        .map(|&format| TelemetryHandle { format })
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let stderr = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(stderr.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(stderr.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
