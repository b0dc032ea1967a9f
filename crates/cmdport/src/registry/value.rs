//! Value kinds and their text rendering.

use std::fmt;

/// Kind of a procedure parameter or return value.
///
/// Parameters are restricted to the five scalar kinds (see
/// [`Kind::is_parameter`]); return values may be any kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `true` or `false`.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// Unsigned 64-bit integer.
    Uint,
    /// 64-bit float.
    Float,
    /// UTF-8 text.
    Str,
    /// Homogeneous list of values.
    List(Box<Kind>),
    /// No value.
    Unit,
}

impl Kind {
    /// Whether values of this kind can be parsed from a single argument token.
    #[must_use]
    pub fn is_parameter(&self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Int | Self::Uint | Self::Float | Self::Str
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int64"),
            Self::Uint => f.write_str("uint64"),
            Self::Float => f.write_str("float64"),
            Self::Str => f.write_str("string"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::Unit => f.write_str("()"),
        }
    }
}

/// A typed argument or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value.
    Uint(u64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Str(String),
    /// List of values.
    List(Vec<Value>),
}

impl Value {
    /// Kind of this value. Empty lists report a list of [`Kind::Unit`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Bool(_) => Kind::Bool,
            Self::Int(_) => Kind::Int,
            Self::Uint(_) => Kind::Uint,
            Self::Float(_) => Kind::Float,
            Self::Str(_) => Kind::Str,
            Self::List(items) => Kind::List(Box::new(
                items.first().map_or(Kind::Unit, Self::kind),
            )),
        }
    }
}

/// Renders the value as it appears on the wire.
///
/// Strings are written bare when that is unambiguous and quoted with Rust
/// escapes otherwise, so a scripted client can always split a response on
/// whitespace outside quotes.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Uint(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) if needs_quoting(value) => write!(f, "{value:?}"),
            Self::Str(value) => f.write_str(value),
            Self::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

fn needs_quoting(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control() || ch == '"' || ch == '\\')
}
