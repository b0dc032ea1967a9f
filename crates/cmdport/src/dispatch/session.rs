//! Per-stream session loop.

use std::io::{BufRead, BufReader, Read, Write};
use std::sync::Arc;

use tracing::debug;

use cmdport_config::{Config, DEFAULT_MAX_LINE_BYTES, LockScope};

use crate::registry::{Procedure, Registry, Value};

use super::DISPATCH_TARGET;
use super::coerce::coerce_arguments;
use super::command::{Call, Command, MetaCommand};
use super::errors::{CommandError, SessionError};
use super::response::{Response, ResponseWriter};

/// Executes request lines against a shared [`Registry`].
///
/// A dispatcher is cheap to clone and holds no per-session state; the
/// listener hands one clone to every connection.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    lock_scope: LockScope,
    max_line_bytes: usize,
}

impl Dispatcher {
    /// Creates a dispatcher with the default lock scope and line limit.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            lock_scope: LockScope::default(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Creates a dispatcher using the limits from `config`.
    #[must_use]
    pub fn from_config(registry: Arc<Registry>, config: &Config) -> Self {
        Self::new(registry)
            .with_lock_scope(config.lock_scope())
            .with_max_line_bytes(config.max_line_bytes())
    }

    /// Sets how long shared registry access is held for each call.
    #[must_use]
    pub fn with_lock_scope(mut self, lock_scope: LockScope) -> Self {
        self.lock_scope = lock_scope;
        self
    }

    /// Sets the longest accepted request line, excluding the newline.
    #[must_use]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Registry commands are resolved against.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Serves one session until the client disconnects or quits.
    ///
    /// Writes the banner, then answers each non-empty line with one
    /// response. Command failures are reported to the client and do not end
    /// the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when reading or writing the stream fails or a
    /// request line exceeds the configured limit.
    pub fn serve<S: Read + Write>(&self, stream: S) -> Result<(), SessionError> {
        let mut reader = BufReader::new(stream);
        ResponseWriter::new(reader.get_mut()).write_banner()?;

        let mut line = Vec::new();
        loop {
            line.clear();
            if read_line(&mut reader, &mut line, self.max_line_bytes)? == 0 {
                debug!(target: DISPATCH_TARGET, "client closed the session");
                return Ok(());
            }

            let response = match std::str::from_utf8(&line) {
                Ok(text) => match self.execute_line(text) {
                    Some(response) => response,
                    None => continue,
                },
                Err(_) => Response::Failure(CommandError::InvalidUtf8),
            };

            ResponseWriter::new(reader.get_mut()).write_response(&response)?;
            if response.closes_session() {
                debug!(target: DISPATCH_TARGET, "client quit the session");
                return Ok(());
            }
        }
    }

    /// Executes one request line, or returns `None` when it is blank.
    #[must_use]
    pub fn execute_line(&self, line: &str) -> Option<Response> {
        let response = match Command::parse(line)? {
            Command::Meta(meta) => self.run_meta(meta),
            Command::Call(call) => match self.run_call(&call) {
                Ok(values) => Response::Values(values),
                Err(error) => {
                    debug!(target: DISPATCH_TARGET, procedure = call.name, %error, "command failed");
                    Response::Failure(error)
                }
            },
        };
        Some(response)
    }

    fn run_call(&self, call: &Call<'_>) -> Result<Vec<Value>, CommandError> {
        debug!(
            target: DISPATCH_TARGET,
            procedure = call.name,
            arguments = call.args.len(),
            "dispatching call"
        );
        match self.lock_scope {
            LockScope::Call => self
                .registry
                .with_procedure(call.name, |procedure| invoke(call, procedure))?,
            LockScope::Lookup => {
                let procedure = self.registry.lookup(call.name)?;
                invoke(call, procedure.as_deref())
            }
        }
    }

    fn run_meta(&self, meta: MetaCommand<'_>) -> Response {
        match meta {
            MetaCommand::Quit => Response::Goodbye,
            MetaCommand::Help(None) => match self.registry.procedures() {
                Ok(procedures) => Response::Listing(
                    procedures
                        .iter()
                        .map(|procedure| describe(procedure))
                        .collect(),
                ),
                Err(error) => Response::Failure(error.into()),
            },
            MetaCommand::Help(Some(name)) => match self.registry.lookup(name) {
                Ok(Some(procedure)) => Response::Listing(vec![describe(&procedure)]),
                Ok(None) => Response::Failure(CommandError::unknown_command(name)),
                Err(error) => Response::Failure(error.into()),
            },
        }
    }
}

fn invoke(call: &Call<'_>, procedure: Option<&Procedure>) -> Result<Vec<Value>, CommandError> {
    let procedure = procedure.ok_or_else(|| CommandError::unknown_command(call.name))?;
    let params = procedure.params();
    if call.args.len() != params.len() {
        return Err(CommandError::argument_count(
            call.name,
            params.len(),
            call.args.len(),
        ));
    }
    let args = coerce_arguments(params, &call.args)?;
    procedure
        .invoke(&args)
        .map_err(|source| CommandError::procedure_failed(call.name, source))
}

fn describe(procedure: &Procedure) -> String {
    if procedure.description().is_empty() {
        procedure.signature().to_string()
    } else {
        format!("{}: {}", procedure.signature(), procedure.description())
    }
}

/// Reads one line of at most `limit` bytes plus its newline.
///
/// Returns the number of bytes read; zero means end of stream. A final line
/// without a newline is returned as is.
fn read_line<R: BufRead>(
    reader: &mut R,
    line: &mut Vec<u8>,
    limit: usize,
) -> Result<usize, SessionError> {
    let budget = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let read = reader.take(budget).read_until(b'\n', line)?;
    let exhausted = u64::try_from(read).is_ok_and(|read| read == budget);
    if exhausted && line.last() != Some(&b'\n') {
        return Err(SessionError::LineTooLong { limit });
    }
    Ok(read)
}
