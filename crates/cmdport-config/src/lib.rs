//! Shared configuration for the cmdport library and daemon.
//!
//! Values are layered by `ortho_config`: built-in defaults, then a TOML file
//! (`--config-path` or the standard discovery locations), then `CMDPORT_*`
//! environment variables, then command-line flags.

mod defaults;
mod logging;
mod scope;
mod socket;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_LINE_BYTES, DEFAULT_TCP_PORT, default_lock_scope,
    default_log_filter_string, default_log_format, default_max_line_bytes,
    default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use scope::{LockScope, LockScopeParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "CMDPORT")]
pub struct Config {
    /// Endpoint the daemon listens on.
    #[ortho_config(default = default_socket_endpoint())]
    pub listen_socket: SocketEndpoint,
    /// `tracing` filter directive, e.g. `info` or `cmdport::dispatch=debug`.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Longest request line accepted from a session.
    #[ortho_config(default = default_max_line_bytes())]
    pub max_line_bytes: usize,
    /// Registry access policy while a command is dispatched.
    #[ortho_config(default = default_lock_scope())]
    pub lock_scope: LockScope,
}

impl Config {
    /// Endpoint the daemon listens on.
    #[must_use]
    pub fn listen_socket(&self) -> &SocketEndpoint {
        &self.listen_socket
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Longest request line accepted from a session.
    #[must_use]
    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    /// Registry access policy while a command is dispatched.
    #[must_use]
    pub fn lock_scope(&self) -> LockScope {
        self.lock_scope
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            max_line_bytes: default_max_line_bytes(),
            lock_scope: default_lock_scope(),
        }
    }
}
