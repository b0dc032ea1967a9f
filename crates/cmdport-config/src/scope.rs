//! Registry access policy applied while a session dispatches a call.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How long a session keeps shared registry access for a single command.
///
/// `Call` keeps shared access across lookup, argument coercion and the
/// procedure invocation, so a slow procedure delays any concurrent
/// registration until it returns. `Lookup` only holds access while the
/// immutable descriptor is cloned out of the registry; the invocation then
/// runs without blocking registration.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LockScope {
    /// Hold shared access until the invocation returns.
    #[default]
    Call,
    /// Release shared access once the descriptor has been resolved.
    Lookup,
}

/// Errors encountered while parsing a [`LockScope`] from text.
pub type LockScopeParseError = strum::ParseError;
