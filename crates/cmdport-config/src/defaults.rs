use camino::Utf8PathBuf;

#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

use crate::logging::LogFormat;
use crate::scope::LockScope;
use crate::socket::SocketEndpoint;

/// Default TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 9780;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Longest request line a session accepts, in bytes, excluding the newline.
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default registry access policy for dispatched calls.
#[must_use]
pub fn default_lock_scope() -> LockScope {
    LockScope::Call
}

/// Default request line limit.
#[must_use]
pub fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}

/// Computes the default listening endpoint.
///
/// On Unix this is `cmdport/cmdport.sock` under the user's runtime directory,
/// falling back to a per-uid directory below the system temporary directory.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    let mut base = match runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok()) {
        Some(dir) => dir.join("cmdport"),
        None => fallback_base_directory()
            .join("cmdport")
            .join(user_namespace()),
    };
    base.push("cmdport.sock");
    SocketEndpoint::unix(base)
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(std::env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn default_endpoint_is_a_unix_socket_named_for_the_daemon() {
        let endpoint = default_socket_endpoint();
        let path = endpoint.unix_path().expect("unix endpoint");
        assert_eq!(path.file_name(), Some("cmdport.sock"));
        assert!(path.as_str().contains("cmdport"));
    }

    #[test]
    fn line_limit_matches_scanner_default() {
        assert_eq!(default_max_line_bytes(), 65_536);
    }
}
