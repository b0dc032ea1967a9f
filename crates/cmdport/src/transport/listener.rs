//! Socket listener running the accept loop on a background thread.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use cmdport_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::Path;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Listener bound to a socket endpoint, not yet accepting.
#[derive(Debug)]
pub struct SocketListener {
    endpoint: SocketEndpoint,
    listener: ListenerKind,
}

#[derive(Debug)]
enum ListenerKind {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl SocketListener {
    /// Binds the endpoint.
    ///
    /// A leftover Unix socket file is removed when nothing answers on it; a
    /// socket that is still served is left alone and reported as in use.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the address cannot be resolved or bound.
    pub fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let listener = match endpoint {
            SocketEndpoint::Tcp { host, port } => ListenerKind::Tcp(bind_tcp(endpoint, host, *port)?),
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => ListenerKind::Unix(bind_unix(endpoint, path.as_std_path())?),
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => {
                return Err(ListenerError::UnsupportedUnix {
                    endpoint: endpoint.to_string(),
                });
            }
        };
        Ok(Self {
            endpoint: endpoint.clone(),
            listener,
        })
    }

    /// Endpoint this listener was bound from.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Bound TCP address, useful when the configured port was zero.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.listener {
            ListenerKind::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            ListenerKind::Unix(_) => None,
        }
    }

    /// Starts accepting connections on a background thread.
    ///
    /// Each accepted connection is served on its own `cmdport-session-<n>`
    /// thread.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::NonBlocking`] when the socket cannot be
    /// switched to non-blocking mode and [`ListenerError::Spawn`] when the
    /// accept thread cannot be started. The Unix socket file is removed in
    /// both cases.
    pub fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        let nonblocking = match &self.listener {
            ListenerKind::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            ListenerKind::Unix(listener) => listener.set_nonblocking(true),
        };
        if let Err(source) = nonblocking {
            #[cfg(unix)]
            cleanup_unix_socket(&self.endpoint);
            return Err(ListenerError::NonBlocking { source });
        }

        let state = Arc::new(AcceptState::default());
        let loop_state = Arc::clone(&state);
        #[cfg(unix)]
        let endpoint = self.endpoint.clone();
        let spawned = thread::Builder::new()
            .name("cmdport-accept".to_owned())
            .spawn(move || run_accept_loop(&self, &loop_state, &handler));
        match spawned {
            Ok(accept_thread) => Ok(ListenerHandle {
                state,
                thread: Some(accept_thread),
            }),
            Err(source) => {
                #[cfg(unix)]
                cleanup_unix_socket(&endpoint);
                Err(ListenerError::Spawn { source })
            }
        }
    }
}

/// Flags shared between the accept loop and its handle.
#[derive(Debug, Default)]
struct AcceptState {
    stopping: AtomicBool,
    accepted: AtomicU64,
}

/// Handle to the background accept loop.
///
/// Dropping the handle requests shutdown without waiting for the thread.
#[derive(Debug)]
pub struct ListenerHandle {
    state: Arc<AcceptState>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to stop. Sessions already running continue.
    pub fn shutdown(&self) {
        self.state.stopping.store(true, Ordering::SeqCst);
    }

    /// Connections accepted so far.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.state.accepted.load(Ordering::SeqCst)
    }

    /// Waits for the accept loop to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::AcceptLoopPanicked`] if the accept loop
    /// panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        self.thread.take().map_or(Ok(()), |accept_thread| {
            accept_thread
                .join()
                .map_err(|_| ListenerError::AcceptLoopPanicked)
        })
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_accept_loop(
    listener: &SocketListener,
    state: &AcceptState,
    handler: &Arc<dyn ConnectionHandler>,
) {
    info!(target: LISTENER_TARGET, endpoint = %listener.endpoint, "accepting connections");
    let mut repeated_error = None::<io::ErrorKind>;
    while !state.stopping.load(Ordering::SeqCst) {
        let stream = match accept_connection(listener) {
            Ok(Some(stream)) => stream,
            Ok(None) => {
                thread::sleep(ACCEPT_BACKOFF);
                continue;
            }
            Err(error) => {
                if repeated_error.replace(error.kind()) != Some(error.kind()) {
                    warn!(target: LISTENER_TARGET, %error, "accept failed");
                }
                thread::sleep(ERROR_BACKOFF);
                continue;
            }
        };
        repeated_error = None;

        let session = state.accepted.fetch_add(1, Ordering::SeqCst) + 1;
        let handler = Arc::clone(handler);
        let spawned = thread::Builder::new()
            .name(format!("cmdport-session-{session}"))
            .spawn(move || handler.handle(stream));
        if let Err(error) = spawned {
            warn!(target: LISTENER_TARGET, session, %error, "dropping connection");
        }
    }
    debug!(
        target: LISTENER_TARGET,
        endpoint = %listener.endpoint,
        accepted = state.accepted.load(Ordering::SeqCst),
        "accept loop stopped"
    );

    #[cfg(unix)]
    cleanup_unix_socket(&listener.endpoint);
}

fn accept_connection(listener: &SocketListener) -> io::Result<Option<ConnectionStream>> {
    let accepted = match &listener.listener {
        ListenerKind::Tcp(tcp) => tcp.accept().and_then(|(stream, _)| {
            stream.set_nonblocking(false)?;
            Ok(ConnectionStream::Tcp(stream))
        }),
        #[cfg(unix)]
        ListenerKind::Unix(unix) => unix.accept().and_then(|(stream, _)| {
            stream.set_nonblocking(false)?;
            Ok(ConnectionStream::Unix(stream))
        }),
    };
    match accepted {
        Ok(stream) => Ok(Some(stream)),
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}

fn bind_tcp(
    endpoint: &SocketEndpoint,
    host: &str,
    port: u16,
) -> Result<TcpListener, ListenerError> {
    let resolve_error = |source| ListenerError::Resolve {
        endpoint: endpoint.to_string(),
        source,
    };
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(resolve_error)?
        .next()
        .ok_or_else(|| {
            resolve_error(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no addresses returned",
            ))
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::Bind {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[cfg(unix)]
fn bind_unix(endpoint: &SocketEndpoint, path: &Path) -> Result<UnixListener, ListenerError> {
    let shown = || path.display().to_string();
    let stale = |source| ListenerError::StaleSocket {
        path: shown(),
        source,
    };
    if path.exists() {
        let metadata = fs::symlink_metadata(path).map_err(stale)?;
        if !metadata.file_type().is_socket() {
            return Err(ListenerError::NotASocket { path: shown() });
        }
        match UnixStream::connect(path) {
            Ok(_) => return Err(ListenerError::SocketInUse { path: shown() }),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
                ) =>
            {
                debug!(target: LISTENER_TARGET, path = %path.display(), "removing stale socket");
                fs::remove_file(path).map_err(stale)?;
            }
            Err(source) => return Err(stale(source)),
        }
    }

    UnixListener::bind(path).map_err(|source| ListenerError::Bind {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[cfg(unix)]
fn cleanup_unix_socket(endpoint: &SocketEndpoint) {
    let Some(path) = endpoint.unix_path() else {
        return;
    };
    if let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: LISTENER_TARGET,
            %error,
            %path,
            "failed to remove unix socket file"
        );
    }
}
