//! Error types for command dispatch.
//!
//! [`CommandError`] covers failures local to one request line. They are
//! rendered back to the client and the session keeps reading.
//! [`SessionError`] covers transport failures, which end the session and are
//! returned from [`Dispatcher::serve`](super::Dispatcher::serve).

use std::io;

use thiserror::Error;

use crate::registry::{Kind, ProcedureFailure, RegistryError};

/// Failures of a single command. The session continues after reporting one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// No procedure is registered under the name.
    #[error("unknown command '{name}'")]
    UnknownCommand {
        /// Name taken from the request line.
        name: String,
    },

    /// The number of argument tokens differs from the parameter count.
    #[error("'{name}' expects {expected} argument(s), got {actual}")]
    ArgumentCountMismatch {
        /// Procedure name.
        name: String,
        /// Declared parameter count.
        expected: usize,
        /// Tokens supplied.
        actual: usize,
    },

    /// An argument token could not be parsed as the declared kind.
    #[error("bad argument at position {position}: expected {expected}, got '{token}'")]
    ArgumentCoercion {
        /// One-based argument position.
        position: usize,
        /// Declared parameter kind.
        expected: Kind,
        /// Offending token as sent.
        token: String,
    },

    /// The procedure ran and reported a failure.
    #[error("procedure '{name}' failed: {source}")]
    ProcedureFailed {
        /// Procedure name.
        name: String,
        /// Failure reported by the procedure.
        #[source]
        source: ProcedureFailure,
    },

    /// The request line was not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// The registry could not be read.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl CommandError {
    /// Creates an unknown command error.
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand { name: name.into() }
    }

    /// Creates an argument count error.
    pub fn argument_count(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ArgumentCountMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// Creates a coercion error for the one-based `position`.
    pub fn coercion(position: usize, expected: Kind, token: impl Into<String>) -> Self {
        Self::ArgumentCoercion {
            position,
            expected,
            token: token.into(),
        }
    }

    /// Creates a procedure failure error.
    pub fn procedure_failed(name: impl Into<String>, source: ProcedureFailure) -> Self {
        Self::ProcedureFailed {
            name: name.into(),
            source,
        }
    }
}

/// Transport failures that terminate a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading from or writing to the stream failed.
    #[error("session I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A request line exceeded the configured limit.
    #[error("request line exceeds {limit} byte limit")]
    LineTooLong {
        /// Configured maximum line length in bytes.
        limit: usize,
    },
}
