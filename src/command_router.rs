use crate::error::{AppError, AppResult};
use tracing::debug;

/// A parsed interactive command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Analyze(String),
    Generate(String),
    Explain(String),
    Refactor(String),
    Help,
    Shortcuts,
    Exit,
    Unknown(String),
}

impl Command {
    /// Whether the command talks to the remote service with stored credentials.
    pub fn needs_credentials(&self) -> bool {
        matches!(
            self,
            Command::Analyze(_) | Command::Generate(_) | Command::Explain(_) | Command::Refactor(_)
        )
    }
}

/// Splits a line into verb and argument and maps it to a [`Command`].
///
/// The verb is the first whitespace-separated token, lowercased. The
/// remaining tokens are joined with single spaces into one argument.
pub fn parse_command(line: &str) -> AppResult<Command> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().unwrap_or_default().to_lowercase();
    let argument = tokens.collect::<Vec<_>>().join(" ");
    debug!("Parsed verb '{}' with argument '{}'", verb, argument);

    let command = match verb.as_str() {
        "/login" => Command::Login,
        "/analyze" => Command::Analyze(required(argument, "/analyze <file>")?),
        "/generate" => Command::Generate(required(argument, "/generate <description>")?),
        "/explain" => Command::Explain(required(argument, "/explain <file>")?),
        "/refactor" => Command::Refactor(required(argument, "/refactor <file>")?),
        "/help" => Command::Help,
        "?" => Command::Shortcuts,
        "/exit" | "/quit" => Command::Exit,
        _ => Command::Unknown(verb),
    };
    Ok(command)
}

fn required(argument: String, usage: &str) -> AppResult<String> {
    if argument.is_empty() {
        return Err(AppError::validation(format!("Usage: {}", usage)));
    }
    Ok(argument)
}
