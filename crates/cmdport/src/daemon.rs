//! Daemon lifecycle: bind, serve, wait for shutdown.

use std::io;
use std::sync::Arc;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use cmdport_config::{Config, SocketPreparationError};

use crate::dispatch::{Dispatcher, SessionHandler};
use crate::registry::{Registry, RegistryError};
use crate::transport::{ListenerError, SocketListener};

const DAEMON_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::daemon");

/// Blocks until the daemon should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once shutdown should proceed.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the notification mechanism cannot be
    /// installed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Waits for SIGTERM, SIGINT, SIGQUIT or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(target: DAEMON_TARGET, signal, "shutdown signal received");
        }
        Ok(())
    }
}

/// Errors that stop the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The socket directory could not be prepared.
    #[error("failed to prepare listening socket: {0}")]
    Socket(#[from] SocketPreparationError),
    /// Binding or running the listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// The registry lock was poisoned before serving started.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Waiting for shutdown failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

/// Serves `registry` on the configured endpoint until `shutdown` fires.
///
/// Sessions still running when shutdown fires are not interrupted; only the
/// accept loop stops.
///
/// # Errors
///
/// Returns [`DaemonError`] when the endpoint cannot be prepared or bound, the
/// registry is poisoned, or the shutdown signal cannot be awaited.
pub fn run_daemon(
    config: &Config,
    registry: Arc<Registry>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), DaemonError> {
    let procedures = registry.names()?.len();
    let endpoint = config.listen_socket();
    endpoint.prepare_filesystem()?;
    let listener = SocketListener::bind(endpoint)?;

    let handler = SessionHandler::new(Dispatcher::from_config(registry, config));
    let handle = listener.start(Arc::new(handler))?;
    info!(
        target: DAEMON_TARGET,
        %endpoint,
        procedures,
        lock_scope = %config.lock_scope(),
        "daemon serving"
    );

    let waited = shutdown.wait();
    handle.shutdown();
    handle.join()?;
    waited?;
    info!(target: DAEMON_TARGET, "daemon stopped");
    Ok(())
}
