//! Uniform procedure adapters.
//!
//! Every registered procedure is stored as a [`Callable`]: the declared
//! parameter and return kinds plus an adapter taking positional [`Value`]s and
//! producing return values. Plain Rust functions and closures convert into
//! adapters through [`IntoCallable`], which derives the kinds from the
//! function signature at compile time.

use std::fmt;
use std::iter::Enumerate;
use std::slice::Iter;
use std::sync::Arc;

use thiserror::Error;

use super::value::{Kind, Value};

type Adapter = dyn Fn(&[Value]) -> Result<Vec<Value>, ProcedureFailure> + Send + Sync;

/// Error reported by a procedure while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProcedureFailure {
    message: String,
}

impl ProcedureFailure {
    /// Creates a failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Invocable procedure with its declared signature.
///
/// Cloning is cheap and preserves identity: clones share the same adapter, as
/// reported by [`Callable::same_as`].
#[derive(Clone)]
pub struct Callable {
    params: Vec<Kind>,
    returns: Vec<Kind>,
    adapter: Arc<Adapter>,
}

impl Callable {
    /// Builds a callable from explicit kinds and an adapter.
    ///
    /// This is the entry point for generated adapters. The parameter kinds
    /// are validated when the callable is registered, not here.
    pub fn new<F>(params: Vec<Kind>, returns: Vec<Kind>, adapter: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, ProcedureFailure> + Send + Sync + 'static,
    {
        Self {
            params,
            returns,
            adapter: Arc::new(adapter),
        }
    }

    /// Declared parameter kinds in positional order.
    #[must_use]
    pub fn params(&self) -> &[Kind] {
        &self.params
    }

    /// Declared return kinds in order.
    #[must_use]
    pub fn returns(&self) -> &[Kind] {
        &self.returns
    }

    /// Invokes the adapter with positionally bound arguments.
    ///
    /// # Errors
    ///
    /// Returns the failure reported by the procedure, or a failure describing
    /// the first argument that does not match the declared kinds.
    pub fn invoke(&self, args: &[Value]) -> Result<Vec<Value>, ProcedureFailure> {
        (self.adapter)(args)
    }

    /// Whether both callables share the same underlying adapter.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.adapter, &other.adapter)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// Scalar types accepted as procedure parameters.
pub trait Arg: Sized {
    /// Kind declared for this parameter type.
    fn kind() -> Kind;

    /// Extracts the Rust value, or `None` when the value has another kind.
    fn from_value(value: &Value) -> Option<Self>;
}

/// Types that render as a single return value.
pub trait Reply {
    /// Kind declared for this return type.
    fn kind() -> Kind;

    /// Converts into a wire value.
    fn into_value(self) -> Value;
}

/// Procedure return types, possibly carrying several values or a failure.
pub trait Returns {
    /// Declared return kinds in order.
    fn kinds() -> Vec<Kind>;

    /// Converts into wire values, surfacing procedure failures.
    ///
    /// # Errors
    ///
    /// Returns the procedure's own error when it reported one.
    fn into_values(self) -> Result<Vec<Value>, ProcedureFailure>;
}

/// Conversion into a registrable [`Callable`].
///
/// `Marker` only disambiguates the blanket implementations for functions of
/// different arities; callers never name it. A `None` option converts into no
/// callable at all and is rejected at registration.
pub trait IntoCallable<Marker> {
    /// Produces the adapter, or `None` when there is nothing to invoke.
    fn into_callable(self) -> Option<Callable>;
}

impl IntoCallable<Self> for Callable {
    fn into_callable(self) -> Option<Callable> {
        Some(self)
    }
}

impl<C, Marker> IntoCallable<Option<Marker>> for Option<C>
where
    C: IntoCallable<Marker>,
{
    fn into_callable(self) -> Option<Callable> {
        self.and_then(IntoCallable::into_callable)
    }
}

macro_rules! scalar_arg {
    ($ty:ty, $kind:ident, $value:pat => $out:expr) => {
        impl Arg for $ty {
            fn kind() -> Kind {
                Kind::$kind
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    $value => Some($out),
                    _ => None,
                }
            }
        }
    };
}

scalar_arg!(bool, Bool, Value::Bool(inner) => *inner);
scalar_arg!(i64, Int, Value::Int(inner) => *inner);
scalar_arg!(u64, Uint, Value::Uint(inner) => *inner);
scalar_arg!(f64, Float, Value::Float(inner) => *inner);
scalar_arg!(String, Str, Value::Str(inner) => inner.clone());

macro_rules! scalar_reply {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reply for $ty {
                fn kind() -> Kind {
                    Kind::$kind
                }

                fn into_value(self) -> Value {
                    Value::$kind(self.into())
                }
            }

            impl Returns for $ty {
                fn kinds() -> Vec<Kind> {
                    vec![<Self as Reply>::kind()]
                }

                fn into_values(self) -> Result<Vec<Value>, ProcedureFailure> {
                    Ok(vec![self.into_value()])
                }
            }
        )*
    };
}

scalar_reply!(
    bool => Bool,
    i64 => Int,
    u64 => Uint,
    f64 => Float,
    String => Str,
    &'static str => Str,
);

impl<T: Reply> Reply for Vec<T> {
    fn kind() -> Kind {
        Kind::List(Box::new(T::kind()))
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(Reply::into_value).collect())
    }
}

impl<T: Reply> Returns for Vec<T> {
    fn kinds() -> Vec<Kind> {
        vec![<Self as Reply>::kind()]
    }

    fn into_values(self) -> Result<Vec<Value>, ProcedureFailure> {
        Ok(vec![self.into_value()])
    }
}

impl Returns for () {
    fn kinds() -> Vec<Kind> {
        Vec::new()
    }

    fn into_values(self) -> Result<Vec<Value>, ProcedureFailure> {
        Ok(Vec::new())
    }
}

impl<A: Reply, B: Reply> Returns for (A, B) {
    fn kinds() -> Vec<Kind> {
        vec![A::kind(), B::kind()]
    }

    fn into_values(self) -> Result<Vec<Value>, ProcedureFailure> {
        Ok(vec![self.0.into_value(), self.1.into_value()])
    }
}

impl<A: Reply, B: Reply, C: Reply> Returns for (A, B, C) {
    fn kinds() -> Vec<Kind> {
        vec![A::kind(), B::kind(), C::kind()]
    }

    fn into_values(self) -> Result<Vec<Value>, ProcedureFailure> {
        Ok(vec![
            self.0.into_value(),
            self.1.into_value(),
            self.2.into_value(),
        ])
    }
}

impl<R: Returns, E: fmt::Display> Returns for Result<R, E> {
    fn kinds() -> Vec<Kind> {
        R::kinds()
    }

    fn into_values(self) -> Result<Vec<Value>, ProcedureFailure> {
        self.map_err(|error| ProcedureFailure::new(error.to_string()))?
            .into_values()
    }
}

fn bind<T: Arg>(args: &mut Enumerate<Iter<'_, Value>>) -> Result<T, ProcedureFailure> {
    let (index, value) = args
        .next()
        .ok_or_else(|| ProcedureFailure::new("missing argument"))?;
    T::from_value(value).ok_or_else(|| {
        ProcedureFailure::new(format!(
            "argument {} must be {}, got {}",
            index + 1,
            T::kind(),
            value.kind()
        ))
    })
}

macro_rules! function_callable {
    ($($arg:ident $val:ident),*) => {
        impl<F, R, $($arg,)*> IntoCallable<fn($($arg,)*) -> R> for F
        where
            F: Fn($($arg,)*) -> R + Send + Sync + 'static,
            R: Returns,
            $($arg: Arg,)*
        {
            fn into_callable(self) -> Option<Callable> {
                let params: Vec<Kind> = vec![$($arg::kind(),)*];
                let arity = params.len();
                let procedure = self;
                Some(Callable::new(params, R::kinds(), move |args: &[Value]| {
                    if args.len() != arity {
                        return Err(ProcedureFailure::new(format!(
                            "expected {arity} argument(s), got {}",
                            args.len()
                        )));
                    }
                    #[allow(unused_mut, unused_variables)]
                    let mut bound = args.iter().enumerate();
                    $(let $val = bind::<$arg>(&mut bound)?;)*
                    procedure($($val,)*).into_values()
                }))
            }
        }
    };
}

function_callable!();
function_callable!(A a);
function_callable!(A a, B b);
function_callable!(A a, B b, C c);
function_callable!(A a, B b, C c, D d);

#[cfg(test)]
mod tests {
    use super::*;

    fn callable<M>(procedure: impl IntoCallable<M>) -> Callable {
        procedure.into_callable().expect("procedure converts")
    }

    #[test]
    fn derives_kinds_from_function_signature() {
        let add = callable(|left: i64, right: i64| left + right);
        assert_eq!(add.params(), &[Kind::Int, Kind::Int]);
        assert_eq!(add.returns(), &[Kind::Int]);
    }

    #[test]
    fn invokes_with_positional_arguments() {
        let sub = callable(|left: i64, right: i64| left - right);
        let values = sub
            .invoke(&[Value::Int(10), Value::Int(4)])
            .expect("invoke");
        assert_eq!(values, vec![Value::Int(6)]);
    }

    #[test]
    fn tuple_results_become_multiple_values() {
        let split = callable(|flag: bool| (flag, u64::from(flag)));
        assert_eq!(split.returns(), &[Kind::Bool, Kind::Uint]);
        let values = split.invoke(&[Value::Bool(true)]).expect("invoke");
        assert_eq!(values, vec![Value::Bool(true), Value::Uint(1)]);
    }

    #[test]
    fn unit_results_produce_no_values() {
        let noop = callable(|| ());
        assert!(noop.params().is_empty());
        assert!(noop.returns().is_empty());
        assert!(noop.invoke(&[]).expect("invoke").is_empty());
    }

    #[test]
    fn error_results_become_failures() {
        let checked = callable(|value: u64| {
            if value == 0 {
                Err("zero is not allowed")
            } else {
                Ok(value)
            }
        });
        assert_eq!(checked.returns(), &[Kind::Uint]);
        let failure = checked.invoke(&[Value::Uint(0)]).expect_err("zero fails");
        assert_eq!(failure.message(), "zero is not allowed");
    }

    #[test]
    fn list_results_declare_list_kinds() {
        let words = callable(|text: String| {
            text.split(',').map(str::to_owned).collect::<Vec<_>>()
        });
        assert_eq!(words.returns(), &[Kind::List(Box::new(Kind::Str))]);
    }

    #[test]
    fn rejects_mismatched_argument_values() {
        let negate = callable(|value: f64| -value);
        let failure = negate
            .invoke(&[Value::Str("x".to_owned())])
            .expect_err("kind mismatch");
        assert_eq!(failure.message(), "argument 1 must be float64, got string");

        let failure = negate.invoke(&[]).expect_err("arity mismatch");
        assert_eq!(failure.message(), "expected 1 argument(s), got 0");
    }

    #[test]
    fn none_converts_into_nothing() {
        let missing: Option<Callable> = None;
        assert!(missing.into_callable().is_none());
    }

    #[test]
    fn clones_share_identity() {
        let first = callable(|| true);
        let second = first.clone();
        let other = callable(|| true);
        assert!(first.same_as(&second));
        assert!(!first.same_as(&other));
    }
}
