//! Connection handler running one dispatcher session per connection.

use tracing::{debug, info, warn};

use crate::transport::{ConnectionHandler, ConnectionStream};

use super::DISPATCH_TARGET;
use super::session::Dispatcher;

/// Serves every accepted connection as a dispatcher session.
#[derive(Debug, Clone)]
pub struct SessionHandler {
    dispatcher: Dispatcher,
}

impl SessionHandler {
    /// Creates a handler that serves sessions with `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

impl ConnectionHandler for SessionHandler {
    fn handle(&self, stream: ConnectionStream) {
        let peer = stream.peer();
        info!(target: DISPATCH_TARGET, %peer, "session opened");
        match self.dispatcher.serve(stream) {
            Ok(()) => debug!(target: DISPATCH_TARGET, %peer, "session closed"),
            Err(error) => warn!(target: DISPATCH_TARGET, %peer, %error, "session terminated"),
        }
    }
}
