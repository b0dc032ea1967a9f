//! Listener failures.

use std::io;

use thiserror::Error;

/// Errors raised while binding or running a [`SocketListener`](super::SocketListener).
///
/// Endpoints and paths are carried as display strings so the error stays
/// independent of the platform's socket types.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The TCP host did not resolve to any address.
    #[error("cannot resolve {endpoint}: {source}")]
    Resolve {
        /// Endpoint as configured.
        endpoint: String,
        /// Resolver failure.
        #[source]
        source: io::Error,
    },

    /// Binding the socket failed.
    #[error("cannot bind {endpoint}: {source}")]
    Bind {
        /// Endpoint as configured.
        endpoint: String,
        /// Bind failure.
        #[source]
        source: io::Error,
    },

    /// The socket could not be switched to non-blocking accepts.
    #[error("cannot make listener non-blocking: {source}")]
    NonBlocking {
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// The accept thread could not be started.
    #[error("cannot start accept thread: {source}")]
    Spawn {
        /// Spawn failure.
        #[source]
        source: io::Error,
    },

    /// Unix endpoints were configured on a platform without them.
    #[cfg(not(unix))]
    #[error("unix sockets are not available on this platform: {endpoint}")]
    UnsupportedUnix {
        /// Endpoint as configured.
        endpoint: String,
    },

    /// Another process still answers on the socket path.
    #[cfg(unix)]
    #[error("socket {path} is in use by another daemon")]
    SocketInUse {
        /// Socket path.
        path: String,
    },

    /// Something other than a socket occupies the path.
    #[cfg(unix)]
    #[error("{path} exists and is not a socket")]
    NotASocket {
        /// Occupied path.
        path: String,
    },

    /// A leftover socket file could not be inspected or removed.
    #[cfg(unix)]
    #[error("cannot clear stale socket {path}: {source}")]
    StaleSocket {
        /// Socket path.
        path: String,
        /// Inspection, probe or removal failure.
        #[source]
        source: io::Error,
    },

    /// The accept loop panicked.
    #[error("accept loop panicked")]
    AcceptLoopPanicked,
}
