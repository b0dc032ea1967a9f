//! Registered procedure descriptors.

use std::fmt;

use super::callable::{Callable, ProcedureFailure};
use super::value::{Kind, Value};

/// Immutable descriptor of a registered procedure.
#[derive(Debug, Clone)]
pub struct Procedure {
    name: String,
    description: String,
    callable: Callable,
}

impl Procedure {
    pub(crate) fn new(name: String, description: String, callable: Callable) -> Self {
        Self {
            name,
            description,
            callable,
        }
    }

    /// Name the procedure is invoked by.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form help text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Parameter kinds in positional order.
    #[must_use]
    pub fn params(&self) -> &[Kind] {
        self.callable.params()
    }

    /// Return kinds in order.
    #[must_use]
    pub fn returns(&self) -> &[Kind] {
        self.callable.returns()
    }

    /// The adapter registered for this procedure.
    #[must_use]
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Invokes the procedure synchronously.
    ///
    /// # Errors
    ///
    /// Returns the failure reported by the procedure.
    pub fn invoke(&self, args: &[Value]) -> Result<Vec<Value>, ProcedureFailure> {
        self.callable.invoke(args)
    }

    /// Signature line shown by `help`, e.g. `add(int64, int64) -> (int64)`.
    #[must_use]
    pub fn signature(&self) -> Signature<'_> {
        Signature(self)
    }
}

/// Display adapter rendering a procedure signature.
#[derive(Debug, Clone, Copy)]
pub struct Signature<'a>(&'a Procedure);

impl fmt::Display for Signature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.0.name)?;
        write_kinds(f, self.0.params())?;
        f.write_str(") -> (")?;
        write_kinds(f, self.0.returns())?;
        f.write_str(")")
    }
}

fn write_kinds(f: &mut fmt::Formatter<'_>, kinds: &[Kind]) -> fmt::Result {
    for (index, kind) in kinds.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{kind}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::IntoCallable;

    #[test]
    fn renders_signature() {
        let callable = (|text: String, times: u64| text.repeat(usize::try_from(times).unwrap_or(0)))
            .into_callable()
            .expect("callable");
        let procedure = Procedure::new("repeat".to_owned(), "Repeats text".to_owned(), callable);
        assert_eq!(
            procedure.signature().to_string(),
            "repeat(string, uint64) -> (string)"
        );
    }

    #[test]
    fn renders_signature_without_values() {
        let callable = (|| ()).into_callable().expect("callable");
        let procedure = Procedure::new("ping".to_owned(), String::new(), callable);
        assert_eq!(procedure.signature().to_string(), "ping() -> ()");
    }
}
