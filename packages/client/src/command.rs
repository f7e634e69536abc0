//! REPL input parsing.

use std::path::PathBuf;

pub const HELP: &str = "\
Type a message and press Enter to send it to the active participants.

  /who                 list participants (* = active)
  /add <id>            add a participant to the conversation
  /remove <id>         remove a participant from the conversation
  /reset               clear the conversation and start over
  /transcript [path]   write the conversation as JSON
  /help                show this help
  /quit                leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Who,
    Add(String),
    Remove(String),
    Reset,
    Transcript(Option<PathBuf>),
    Help,
    Quit,
    /// A `/` command that is not recognised or is missing its argument
    Invalid(String),
}

impl Command {
    /// `None` for a blank line.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Command::Send(line.to_string()));
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

        let command = match (name, arg) {
            ("who", _) => Command::Who,
            ("add", Some(id)) => Command::Add(id.to_string()),
            ("remove", Some(id)) => Command::Remove(id.to_string()),
            ("reset", _) => Command::Reset,
            ("transcript", path) => Command::Transcript(path.map(PathBuf::from)),
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            ("add" | "remove", None) => Command::Invalid(format!("usage: /{name} <id>")),
            _ => Command::Invalid(format!("unknown command: /{name} (try /help)")),
        };
        Some(command)
    }
}
