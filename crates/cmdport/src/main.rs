//! `cmdportd`: serves the stock procedures on the configured socket.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use tracing::error;

use cmdport::{Config, Registry, SystemShutdownSignal, run_daemon, stock, telemetry};

fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(error) => {
            let _ = writeln!(io::stderr(), "cmdportd: failed to load configuration: {error}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(error) = telemetry::initialise(&config) {
        let _ = writeln!(io::stderr(), "cmdportd: {error}");
        return ExitCode::FAILURE;
    }

    let registry = Registry::new();
    if let Err(error) = stock::install(&registry) {
        error!(%error, "stock procedure registration failed");
        return ExitCode::FAILURE;
    }

    match run_daemon(&config, Arc::new(registry), &SystemShutdownSignal) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "daemon failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<Config, Arc<OrthoError>> {
    Config::load()
}
