//! Connection streams and the handler seam.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::TcpStream;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Stream types accepted by the listener.
pub enum ConnectionStream {
    /// TCP connection.
    Tcp(TcpStream),
    /// Unix domain socket connection.
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Human-readable description of the remote end, for logging.
    #[must_use]
    pub fn peer(&self) -> Peer {
        match self {
            Self::Tcp(stream) => stream
                .peer_addr()
                .map_or(Peer::Unknown, |addr| Peer::Tcp(addr.to_string())),
            #[cfg(unix)]
            Self::Unix(_) => Peer::Unix,
        }
    }
}

/// Remote end of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    /// TCP peer address.
    Tcp(String),
    /// Unix socket peer; these are unnamed.
    Unix,
    /// The peer address could not be determined.
    Unknown,
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            Self::Unix => f.write_str("unix"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Handles accepted connections.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection until it ends. Implementations should
    /// avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn tcp_peer_reports_remote_address() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let addr = listener.local_addr().expect("addr");
        let client = TcpStream::connect(addr).expect("connect");
        let (accepted, remote) = listener.accept().expect("accept");

        let peer = ConnectionStream::Tcp(accepted).peer();
        assert_eq!(peer, Peer::Tcp(remote.to_string()));
        assert!(peer.to_string().starts_with("tcp://127.0.0.1:"));
        drop(client);
    }
}
