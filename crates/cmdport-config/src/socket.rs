//! Socket endpoints the daemon listens on.

use std::fmt;
use std::fs::DirBuilder;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Where the daemon accepts sessions.
///
/// Endpoints are written as URLs on the command line and in the environment:
/// `unix:///run/user/1000/cmdport/cmdport.sock` or `tcp://127.0.0.1:9780`.
/// Configuration files use the tagged table form
/// `{ transport = "tcp", host = "127.0.0.1", port = 9780 }`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain socket endpoint.
    Unix { path: Utf8PathBuf },
    /// TCP socket endpoint.
    Tcp { host: String, port: u16 },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP socket endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket path for Unix endpoints.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the parent directory of a Unix socket with owner-only access.
    ///
    /// TCP endpoints need no filesystem preparation and always succeed.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .ok_or_else(|| SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            })?;

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        builder
            .create(parent.as_std_path())
            .map_err(|source| SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => match url.path() {
                "" | "/" => Err(SocketParseError::MissingUnixPath(input.to_owned())),
                path => Ok(Self::unix(path)),
            },
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| SocketParseError::MissingHost(input.to_owned()))?;
                let port = url
                    .port()
                    .ok_or_else(|| SocketParseError::MissingPort(input.to_owned()))?;
                Ok(Self::tcp(host, port))
            }
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

/// Errors encountered while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Scheme was neither `unix` nor `tcp`.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP host name was missing.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// TCP port was missing from the address.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// Unix socket path was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// Text was not a URL at all.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised when preparing the directory holding a Unix socket.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The socket path has no parent directory component.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent { path: Utf8PathBuf },
    /// Creating the parent directory failed.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn displays_unix_socket_as_url() {
        let endpoint = SocketEndpoint::unix("/tmp/cmdport.sock");
        assert_eq!(endpoint.to_string(), "unix:///tmp/cmdport.sock");
    }

    #[rstest]
    #[case("tcp://127.0.0.1:9000", SocketEndpoint::tcp("127.0.0.1", 9000))]
    #[case("unix:///run/cmdport.sock", SocketEndpoint::unix("/run/cmdport.sock"))]
    fn parses_endpoint_urls(#[case] input: &str, #[case] expected: SocketEndpoint) {
        let endpoint: SocketEndpoint = input.parse().expect("parse endpoint");
        assert_eq!(endpoint, expected);
    }

    #[rstest]
    #[case("tcp://127.0.0.1")]
    #[case("unix://")]
    #[case("http://localhost:80")]
    #[case("not a url")]
    fn rejects_incomplete_endpoints(#[case] input: &str) {
        assert!(input.parse::<SocketEndpoint>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let endpoint = SocketEndpoint::tcp("localhost", 9780);
        let parsed: SocketEndpoint = endpoint.to_string().parse().expect("parse endpoint");
        assert_eq!(parsed, endpoint);
    }

    #[test]
    fn prepares_private_socket_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let socket = dir.path().join("nested").join("cmdport.sock");
        let endpoint =
            SocketEndpoint::unix(socket.to_str().expect("utf8 path").to_owned());

        endpoint.prepare_filesystem().expect("prepare socket dir");
        assert!(dir.path().join("nested").is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dir.path().join("nested"))
                .expect("metadata")
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }

    #[test]
    fn rejects_socket_without_parent() {
        let endpoint = SocketEndpoint::unix("cmdport.sock");
        let error = endpoint
            .prepare_filesystem()
            .expect_err("bare file name has no parent");
        assert!(matches!(error, SocketPreparationError::MissingParent { .. }));
    }

    #[test]
    fn tcp_endpoints_need_no_preparation() {
        SocketEndpoint::tcp("127.0.0.1", 0)
            .prepare_filesystem()
            .expect("tcp needs no directory");
    }
}
