//! Runtime procedure registry served over a line-oriented text protocol.
//!
//! Applications register named procedures in a [`Registry`] and serve it on
//! any bidirectional byte stream with a [`Dispatcher`]. Clients send lines of
//! the form `<name> <arg1> ... <argN>` and receive one `ok` or `err` line per
//! request:
//!
//! ```text
//! > add 3 4
//! ok 7
//! > add 3
//! err 'add' expects 2 argument(s), got 1
//! ```
//!
//! Procedures are plain Rust functions or closures whose parameters are
//! `bool`, `i64`, `u64`, `f64` or `String`. Their signatures are captured at
//! registration time, so dispatch needs no runtime type introspection.
//!
//! ```
//! use std::sync::Arc;
//!
//! use cmdport::{Dispatcher, Registry, Response, Value};
//!
//! let registry = Arc::new(Registry::new());
//! registry.register("add", "Adds two integers", |a: i64, b: i64| a + b)?;
//!
//! let dispatcher = Dispatcher::new(Arc::clone(&registry));
//! assert_eq!(
//!     dispatcher.execute_line("add 3 4"),
//!     Some(Response::Values(vec![Value::Int(7)])),
//! );
//! # Ok::<(), cmdport::RegistrationError>(())
//! ```
//!
//! The `cmdportd` binary wires a registry of stock procedures to a Unix or
//! TCP socket using [`run_daemon`].

mod daemon;
pub mod dispatch;
pub mod registry;
pub mod stock;
pub mod telemetry;
pub mod transport;

pub use cmdport_config::{Config, LockScope};
pub use daemon::{DaemonError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon};
pub use dispatch::{CommandError, Dispatcher, Response, SessionError, SessionHandler};
pub use registry::{
    Callable, IntoCallable, Kind, Procedure, ProcedureFailure, RegistrationError, Registry,
    RegistryError, Value,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
