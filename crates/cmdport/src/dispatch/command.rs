//! Classification of request lines.

/// Reserved words recognised before any procedure lookup.
const META_COMMANDS: &[&str] = &["help", "quit", "exit"];

/// Whether `name` is a reserved meta-command.
pub(crate) fn is_meta_command(name: &str) -> bool {
    META_COMMANDS.contains(&name)
}

/// A parsed, non-empty request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command<'a> {
    /// Session-level instruction that never resolves against the registry.
    Meta(MetaCommand<'a>),
    /// Procedure invocation.
    Call(Call<'a>),
}

/// Meta-commands understood by every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MetaCommand<'a> {
    /// `help` lists every procedure; `help <name>` describes one.
    Help(Option<&'a str>),
    /// `quit` or `exit` ends the session.
    Quit,
}

/// Procedure name plus positional argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call<'a> {
    pub(crate) name: &'a str,
    pub(crate) args: Vec<&'a str>,
}

impl<'a> Command<'a> {
    /// Splits `line` on whitespace and classifies it.
    ///
    /// Returns `None` for blank lines. Tokens never contain whitespace, so a
    /// string argument is always a single word.
    pub(crate) fn parse(line: &'a str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next()?;
        let command = match name {
            "help" => Self::Meta(MetaCommand::Help(tokens.next())),
            "quit" | "exit" => Self::Meta(MetaCommand::Quit),
            _ => Self::Call(Call {
                name,
                args: tokens.collect(),
            }),
        };
        Some(command)
    }
}
