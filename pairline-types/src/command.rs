//! Classification of inbound text lines.
//!
//! Classification is purely syntactic: `/list`, `/accept` and `/quit` are
//! exact, case-sensitive literals; `/connect ` is a prefix followed by a
//! whitespace-delimited token. Anything else is not a command and falls
//! through to the relay path.

/// A recognized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/list` - show all connected client ids.
    List,
    /// `/connect <token>` - request pairing with the named client.
    ///
    /// The token is kept verbatim; identifier validation happens at
    /// dispatch so that a malformed token reads as an unknown client.
    Connect(String),
    /// `/accept` - accept the pending request addressed to this client.
    Accept,
    /// `/quit` - disconnect.
    Quit,
}

impl Command {
    /// Classify a line, returning `None` when it is not a command.
    pub fn parse(line: &str) -> Option<Command> {
        match line {
            "/list" => Some(Command::List),
            "/accept" => Some(Command::Accept),
            "/quit" => Some(Command::Quit),
            _ => line
                .strip_prefix("/connect ")
                .and_then(|rest| rest.split_whitespace().next())
                .map(|token| Command::Connect(token.to_string())),
        }
    }
}
