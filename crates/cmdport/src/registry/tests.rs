//! Unit tests for procedure registration and lookup.

use std::sync::{Arc, Barrier};
use std::thread;

use rstest::{fixture, rstest};

use super::*;

fn add(left: i64, right: i64) -> i64 {
    left + right
}

fn echo(text: String) -> String {
    text
}

#[fixture]
fn registry() -> Registry {
    let registry = Registry::new();
    registry
        .register("add", "Adds two integers", add)
        .expect("register add");
    registry
        .register("echo", "Returns its argument", echo)
        .expect("register echo");
    registry
}

fn list_parameter() -> Callable {
    Callable::new(
        vec![Kind::Int, Kind::List(Box::new(Kind::Int))],
        vec![Kind::Int],
        |_| Ok(vec![Value::Int(0)]),
    )
}

#[rstest]
fn distinct_names_both_register(registry: Registry) {
    assert_eq!(registry.len(), 2);
    assert!(registry.contains("add"));
    assert!(registry.contains("echo"));
}

#[rstest]
fn duplicate_name_is_rejected_and_original_survives(registry: Registry) {
    let error = registry
        .register("add", "Multiplies instead", |left: i64, right: i64| left * right)
        .expect_err("duplicate should fail");
    assert_eq!(
        error,
        RegistrationError::NameAlreadyRegistered {
            name: "add".to_owned()
        }
    );

    let procedure = registry.lookup("add").expect("lookup").expect("add exists");
    assert_eq!(procedure.description(), "Adds two integers");
    let values = procedure
        .invoke(&[Value::Int(3), Value::Int(4)])
        .expect("invoke");
    assert_eq!(values, vec![Value::Int(7)]);
}

#[rstest]
fn empty_name_is_rejected(registry: Registry) {
    let error = registry.register("", "nameless", echo).expect_err("empty name");
    assert_eq!(error, RegistrationError::EmptyName);
    assert_eq!(registry.len(), 2);
}

#[rstest]
fn nil_callable_is_rejected(registry: Registry) {
    let error = registry
        .register("ghost", "nothing to call", None::<Callable>)
        .expect_err("nil callable");
    assert_eq!(error, RegistrationError::NilCallable);
    assert!(!registry.contains("ghost"));
}

#[rstest]
fn nil_callable_is_reported_before_empty_name(registry: Registry) {
    let error = registry
        .register("", "", None::<Callable>)
        .expect_err("nil callable");
    assert_eq!(error, RegistrationError::NilCallable);
}

#[rstest]
fn composite_parameter_kind_is_rejected(registry: Registry) {
    let error = registry
        .register("sum", "sums a list", list_parameter())
        .expect_err("list parameter");
    assert_eq!(
        error,
        RegistrationError::UnsupportedParameterKind {
            name: "sum".to_owned(),
            position: 2,
            kind: Kind::List(Box::new(Kind::Int)),
        }
    );
    assert!(error.to_string().contains("parameter 2"));
    assert!(!registry.contains("sum"));
}

#[rstest]
fn composite_return_kinds_are_allowed(registry: Registry) {
    registry
        .register("range", "Counts up", |end: u64| (0..end).collect::<Vec<u64>>())
        .expect("list return");
    let procedure = registry.lookup("range").expect("lookup").expect("range");
    assert_eq!(procedure.returns(), &[Kind::List(Box::new(Kind::Uint))]);
}

#[rstest]
#[case("two words")]
#[case("a\nb")]
#[case("tab\tbed")]
#[case(" padded")]
#[case("bell\u{7}")]
fn unreachable_names_are_rejected(registry: Registry, #[case] name: &str) {
    let error = registry
        .register(name, "cannot be called", || 1_i64)
        .expect_err("name cannot be tokenised");
    assert_eq!(
        error,
        RegistrationError::InvalidName {
            name: name.to_owned()
        }
    );
    assert!(!registry.contains(name));
    assert_eq!(registry.len(), 2);
}

#[rstest]
#[case("help")]
#[case("quit")]
#[case("exit")]
fn meta_command_names_are_reserved(registry: Registry, #[case] name: &str) {
    let error = registry
        .register(name, "shadowed", || true)
        .expect_err("reserved name");
    assert!(matches!(error, RegistrationError::ReservedName { .. }));
}

#[rstest]
fn lookup_returns_the_registered_descriptor() {
    let registry = Registry::new();
    let callable = add.into_callable().expect("callable");
    registry
        .register("add", "Adds two integers", callable.clone())
        .expect("register");

    let procedure = registry.lookup("add").expect("lookup").expect("add exists");
    assert_eq!(procedure.name(), "add");
    assert_eq!(procedure.params(), &[Kind::Int, Kind::Int]);
    assert_eq!(procedure.returns(), &[Kind::Int]);
    assert!(procedure.callable().same_as(&callable));
}

#[rstest]
fn lookup_of_unknown_name_is_none(registry: Registry) {
    assert!(registry.lookup("noop").expect("lookup").is_none());
}

#[rstest]
fn procedures_are_listed_by_name(registry: Registry) {
    registry.register("abs", "Absolute value", i64::abs).expect("register abs");
    let names: Vec<_> = registry
        .procedures()
        .expect("list")
        .iter()
        .map(|procedure| procedure.name().to_owned())
        .collect();
    assert_eq!(names, vec!["abs", "add", "echo"]);
    assert_eq!(registry.names().expect("names"), names);
}

#[test]
fn poisoned_registry_reports_errors_instead_of_panicking() {
    let registry = Registry::new();
    registry.poison();

    assert_eq!(registry.lookup("add").expect_err("poisoned"), RegistryError::Poisoned);
    assert_eq!(
        registry.register("add", "", add).expect_err("poisoned"),
        RegistrationError::Poisoned
    );
    assert!(!registry.contains("add"));
    assert_eq!(registry.len(), 0);
    assert_eq!(registry.names().expect_err("poisoned"), RegistryError::Poisoned);
}

#[rstest]
fn with_procedure_sees_the_descriptor(registry: Registry) {
    let arity = registry
        .with_procedure("add", |procedure| procedure.map(|found| found.params().len()))
        .expect("read");
    assert_eq!(arity, Some(2));
}

#[test]
#[should_panic(expected = "failed to register procedure 'echo'")]
fn must_register_panics_on_duplicates() {
    let registry = Registry::new();
    registry.must_register("echo", "first", echo);
    registry.must_register("echo", "second", echo);
}

#[test]
fn must_register_accepts_valid_procedures() {
    let registry = Registry::new();
    registry.must_register("echo", "Returns its argument", echo);
    assert!(registry.contains("echo"));
}

#[test]
fn racing_registrations_of_one_name_admit_exactly_one() {
    const RACERS: usize = 8;
    let registry = Arc::new(Registry::new());
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|racer| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let racer = u64::try_from(racer).expect("small index");
                barrier.wait();
                registry.register("winner", "raced", move || racer)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("racer thread"))
        .collect();
    let successes = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results.iter().filter_map(|result| result.as_ref().err()).all(
        |error| matches!(error, RegistrationError::NameAlreadyRegistered { .. })
    ));
    assert_eq!(registry.len(), 1);
}

#[test]
fn racing_registrations_of_distinct_names_all_land() {
    const RACERS: usize = 8;
    let registry = Arc::new(Registry::new());
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|racer| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.register(&format!("proc{racer}"), "raced", || ())
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("racer thread").expect("distinct names register");
    }
    assert_eq!(registry.len(), RACERS);
    for racer in 0..RACERS {
        assert!(registry.contains(&format!("proc{racer}")));
    }
}
