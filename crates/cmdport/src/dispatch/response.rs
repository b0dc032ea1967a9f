//! Response framing for the line protocol.
//!
//! Every request line produces exactly one terminal line:
//!
//! ```text
//! ok 7                      successful call, values joined by one space
//! ok                        successful call without return values
//! err unknown command 'x'   failed command
//! ```
//!
//! `help` prints its listing lines before the terminal `ok`, and `quit`
//! answers `ok bye` before the session closes. A client can therefore read
//! lines until one is `ok` or starts with `ok ` or `err `.

use std::fmt::{self, Write as _};
use std::io::{self, BufWriter, Write};

use crate::registry::Value;

use super::errors::CommandError;

/// Greeting written once when a session starts.
pub const BANNER: &str = "cmdport ready; type 'help' for commands";

/// Outcome of one request line.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The procedure returned these values.
    Values(Vec<Value>),
    /// Informational lines, followed by a bare `ok`.
    Listing(Vec<String>),
    /// The command failed; the session continues.
    Failure(CommandError),
    /// The client asked to end the session.
    Goodbye,
}

impl Response {
    /// Whether the session ends after this response.
    #[must_use]
    pub fn closes_session(&self) -> bool {
        matches!(self, Self::Goodbye)
    }
}

/// Writes framed responses to a session stream.
///
/// Output is buffered and reaches the stream in one flush per response.
pub(crate) struct ResponseWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> ResponseWriter<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes the session banner.
    pub(crate) fn write_banner(&mut self) -> io::Result<()> {
        writeln!(self.writer, "{BANNER}")?;
        self.writer.flush()
    }

    /// Writes a response and flushes it to the client.
    ///
    /// Error messages and listing lines are free text; line breaks and other
    /// control characters in them are escaped so each line stays one line.
    pub(crate) fn write_response(&mut self, response: &Response) -> io::Result<()> {
        match response {
            Response::Values(values) => {
                self.writer.write_all(b"ok")?;
                for value in values {
                    write!(self.writer, " {value}")?;
                }
                self.writer.write_all(b"\n")?;
            }
            Response::Listing(lines) => {
                for line in lines {
                    writeln!(self.writer, "{}", OneLine(line))?;
                }
                self.writer.write_all(b"ok\n")?;
            }
            Response::Failure(error) => {
                writeln!(self.writer, "err {}", OneLine(&error.to_string()))?;
            }
            Response::Goodbye => self.writer.write_all(b"ok bye\n")?,
        }
        self.writer.flush()
    }
}

/// Renders text with control characters escaped.
struct OneLine<'a>(&'a str);

impl fmt::Display for OneLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in self.0.chars() {
            if ch.is_control() {
                write!(f, "{}", ch.escape_debug())?;
            } else {
                f.write_char(ch)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::registry::ProcedureFailure;

    use super::*;

    fn render(response: &Response) -> String {
        let mut output = Vec::new();
        ResponseWriter::new(&mut output)
            .write_response(response)
            .expect("write response");
        String::from_utf8(output).expect("valid utf8")
    }

    #[rstest]
    #[case(Response::Values(vec![Value::Int(7)]), "ok 7\n")]
    #[case(Response::Values(Vec::new()), "ok\n")]
    #[case(
        Response::Values(vec![Value::Str("a b".to_owned()), Value::Bool(false)]),
        "ok \"a b\" false\n"
    )]
    #[case(Response::Listing(vec!["one".to_owned(), "two".to_owned()]), "one\ntwo\nok\n")]
    #[case(Response::Failure(CommandError::unknown_command("noop")), "err unknown command 'noop'\n")]
    #[case(Response::Goodbye, "ok bye\n")]
    fn frames_responses(#[case] response: Response, #[case] expected: &str) {
        assert_eq!(render(&response), expected);
    }

    #[test]
    fn free_text_cannot_break_the_line() {
        let failure = Response::Failure(CommandError::procedure_failed(
            "bad",
            ProcedureFailure::new("first\nok 99\r"),
        ));
        assert_eq!(
            render(&failure),
            "err procedure 'bad' failed: first\\nok 99\\r\n"
        );

        let listing = Response::Listing(vec!["bad() -> (): line\nbreak".to_owned()]);
        assert_eq!(render(&listing), "bad() -> (): line\\nbreak\nok\n");
    }

    /// Sink recording every write call it receives.
    #[derive(Default)]
    struct CountingSink {
        writes: usize,
        bytes: Vec<u8>,
    }

    impl Write for CountingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn each_response_reaches_the_stream_in_one_write() {
        let mut sink = CountingSink::default();
        let values = (0..32).map(Value::Int).collect();
        ResponseWriter::new(&mut sink)
            .write_response(&Response::Values(values))
            .expect("write response");
        assert_eq!(sink.writes, 1);
        assert!(sink.bytes.starts_with(b"ok 0 1 2"));
    }

    #[test]
    fn banner_is_a_single_line() {
        let mut output = Vec::new();
        ResponseWriter::new(&mut output).write_banner().expect("banner");
        assert_eq!(output, format!("{BANNER}\n").into_bytes());
    }
}
