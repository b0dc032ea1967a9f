//! Procedures the daemon binary exposes out of the box.

use std::thread;
use std::time::Duration;

use crate::registry::{RegistrationError, Registry};

const OVERFLOW: &str = "integer overflow";

/// Registers the stock procedures.
///
/// # Errors
///
/// Returns the first [`RegistrationError`], typically because a procedure of
/// the same name was registered earlier.
pub fn install(registry: &Registry) -> Result<(), RegistrationError> {
    registry.register("echo", "Returns its argument unchanged", |text: String| text)?;
    registry.register("add", "Adds two integers", |left: i64, right: i64| {
        left.checked_add(right).ok_or(OVERFLOW)
    })?;
    registry.register(
        "sub",
        "Subtracts the second integer from the first",
        |left: i64, right: i64| left.checked_sub(right).ok_or(OVERFLOW),
    )?;
    registry.register("mul", "Multiplies two integers", |left: i64, right: i64| {
        left.checked_mul(right).ok_or(OVERFLOW)
    })?;
    registry.register("divmod", "Quotient and remainder of integer division", divmod)?;
    registry.register("neg", "Negates an integer", |value: i64| {
        value.checked_neg().ok_or(OVERFLOW)
    })?;
    registry.register("concat", "Joins two words", |left: String, right: String| {
        left + &right
    })?;
    registry.register("len", "Counts the characters of a word", |text: String| {
        u64::try_from(text.chars().count()).unwrap_or(u64::MAX)
    })?;
    registry.register("upper", "Upper-cases a word", |text: String| text.to_uppercase())?;
    registry.register("not", "Negates a boolean", |value: bool| !value)?;
    registry.register("split", "Splits a word on a separator", split)?;
    registry.register("version", "Daemon version", || env!("CARGO_PKG_VERSION"))?;
    registry.register(
        "sleep_ms",
        "Blocks the session for a number of milliseconds",
        |millis: u64| thread::sleep(Duration::from_millis(millis)),
    )?;
    Ok(())
}

fn divmod(dividend: i64, divisor: i64) -> Result<(i64, i64), &'static str> {
    if divisor == 0 {
        return Err("division by zero");
    }
    let quotient = dividend.checked_div(divisor).ok_or(OVERFLOW)?;
    let remainder = dividend.checked_rem(divisor).ok_or(OVERFLOW)?;
    Ok((quotient, remainder))
}

fn split(text: String, separator: String) -> Result<Vec<String>, &'static str> {
    if separator.is_empty() {
        return Err("separator must not be empty");
    }
    Ok(text.split(separator.as_str()).map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::{fixture, rstest};

    use crate::dispatch::{Dispatcher, Response};
    use crate::registry::Value;

    use super::*;

    #[fixture]
    fn dispatcher() -> Dispatcher {
        let registry = Registry::new();
        install(&registry).expect("install stock procedures");
        Dispatcher::new(Arc::new(registry))
    }

    #[rstest]
    #[case("add 2 40", vec![Value::Int(42)])]
    #[case("sub 2 40", vec![Value::Int(-38)])]
    #[case("mul -3 7", vec![Value::Int(-21)])]
    #[case("divmod 17 5", vec![Value::Int(3), Value::Int(2)])]
    #[case("neg 9", vec![Value::Int(-9)])]
    #[case("concat foo bar", vec![Value::Str("foobar".to_owned())])]
    #[case("len héllo", vec![Value::Uint(5)])]
    #[case("upper shout", vec![Value::Str("SHOUT".to_owned())])]
    #[case("not false", vec![Value::Bool(true)])]
    #[case(
        "split a,b,c ,",
        vec![Value::List(vec![
            Value::Str("a".to_owned()),
            Value::Str("b".to_owned()),
            Value::Str("c".to_owned()),
        ])]
    )]
    #[case("sleep_ms 1", Vec::new())]
    fn stock_procedures_answer(
        dispatcher: Dispatcher,
        #[case] line: &str,
        #[case] expected: Vec<Value>,
    ) {
        assert_eq!(dispatcher.execute_line(line), Some(Response::Values(expected)));
    }

    #[rstest]
    #[case("add 9223372036854775807 1", "integer overflow")]
    #[case("divmod 1 0", "division by zero")]
    #[case("divmod -9223372036854775808 -1", "integer overflow")]
    fn stock_failures_are_reported(
        dispatcher: Dispatcher,
        #[case] line: &str,
        #[case] message: &str,
    ) {
        let Some(Response::Failure(error)) = dispatcher.execute_line(line) else {
            panic!("expected a failure for {line}");
        };
        assert!(error.to_string().contains(message), "{error}");
    }

    #[rstest]
    fn version_reports_the_crate_version(dispatcher: Dispatcher) {
        assert_eq!(
            dispatcher.execute_line("version"),
            Some(Response::Values(vec![Value::Str(
                env!("CARGO_PKG_VERSION").to_owned()
            )]))
        );
    }

    #[test]
    fn installing_twice_reports_the_duplicate() {
        let registry = Registry::new();
        install(&registry).expect("first install");
        let error = install(&registry).expect_err("second install");
        assert_eq!(
            error,
            RegistrationError::NameAlreadyRegistered {
                name: "echo".to_owned()
            }
        );
    }
}
