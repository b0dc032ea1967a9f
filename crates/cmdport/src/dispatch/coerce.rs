//! Conversion of argument tokens into typed values.

use crate::registry::{Kind, Value};

use super::errors::CommandError;

/// Parses every token into the kind declared at its position.
///
/// The caller has already checked that `tokens` and `kinds` have the same
/// length.
pub(crate) fn coerce_arguments(kinds: &[Kind], tokens: &[&str]) -> Result<Vec<Value>, CommandError> {
    kinds
        .iter()
        .zip(tokens)
        .enumerate()
        .map(|(index, (kind, token))| {
            coerce(token, kind).ok_or_else(|| CommandError::coercion(index + 1, kind.clone(), *token))
        })
        .collect()
}

/// Parses one token as `kind`, or `None` when it is not a valid literal.
pub(crate) fn coerce(token: &str, kind: &Kind) -> Option<Value> {
    match kind {
        Kind::Bool => parse_bool(token).map(Value::Bool),
        Kind::Int => token.parse().ok().map(Value::Int),
        Kind::Uint => token.parse().ok().map(Value::Uint),
        Kind::Float => token.parse().ok().map(Value::Float),
        Kind::Str => Some(Value::Str(token.to_owned())),
        Kind::List(_) | Kind::Unit => None,
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    match token {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
