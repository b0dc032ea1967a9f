//! Errors raised by the procedure registry.

use thiserror::Error;

use super::value::Kind;

/// Reasons a registration is refused.
///
/// Validation stops at the first offending condition, checked in the order
/// the variants are declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// No callable was supplied.
    #[error("invalid argument: callable must not be nil")]
    NilCallable,

    /// The procedure name is empty.
    #[error("invalid argument: name must not be empty")]
    EmptyName,

    /// The name contains whitespace or control characters and could never
    /// be sent as a single request token.
    #[error("invalid argument: name {name:?} must not contain whitespace or control characters")]
    InvalidName {
        /// Rejected name.
        name: String,
    },

    /// The name is a meta-command and could never be reached.
    #[error("invalid argument: name '{name}' is reserved for a meta-command")]
    ReservedName {
        /// Rejected name.
        name: String,
    },

    /// A parameter kind cannot be parsed from an argument token.
    #[error(
        "invalid argument: parameter {position} of '{name}' has unsupported kind {kind}; \
         supported kinds are bool, int64, uint64, float64 and string"
    )]
    UnsupportedParameterKind {
        /// Procedure name.
        name: String,
        /// One-based parameter position.
        position: usize,
        /// Declared kind.
        kind: Kind,
    },

    /// Another procedure already uses the name.
    #[error("name '{name}' has already been registered")]
    NameAlreadyRegistered {
        /// Name already in use.
        name: String,
    },

    /// The registry lock was poisoned by a panicking writer.
    #[error("registry unavailable: lock poisoned")]
    Poisoned,
}

/// Errors raised while reading the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry lock was poisoned by a panicking writer.
    #[error("registry unavailable: lock poisoned")]
    Poisoned,
}
