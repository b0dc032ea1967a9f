//! Line-oriented command dispatch.
//!
//! A session reads newline-delimited requests from a byte stream. Each
//! non-empty line is either a meta-command (`help`, `quit`, `exit`), which is
//! recognised before any registry lookup, or a procedure call of the form
//! `<name> <arg1> ... <argN>`. Calls are resolved against the shared
//! [`Registry`](crate::Registry), their argument tokens are coerced to the
//! declared parameter kinds, and the procedure's return values are written
//! back on a single `ok` line. Per-command failures produce an `err` line and
//! the session keeps reading; only transport failures end it.
//!
//! See [`response`] for the exact framing.

mod coerce;
mod command;
mod errors;
mod handler;
pub mod response;
mod session;

pub(crate) use self::command::is_meta_command;
pub use self::errors::{CommandError, SessionError};
pub use self::handler::SessionHandler;
pub use self::response::{BANNER, Response};
pub use self::session::Dispatcher;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
