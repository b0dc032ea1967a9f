//! Socket transport for daemon sessions.
//!
//! The listener binds a TCP or Unix socket endpoint, accepts connections on a
//! background thread, and hands each one to a [`ConnectionHandler`] on its
//! own thread.

mod errors;
mod handler;
mod listener;

pub use self::errors::ListenerError;
pub use self::handler::{ConnectionHandler, ConnectionStream, Peer};
pub use self::listener::{ListenerHandle, SocketListener};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
