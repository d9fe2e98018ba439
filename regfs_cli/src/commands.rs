//! Browsing commands

use thiserror::Error;

/// Command parse errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// A browsing command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    /// List a directory
    Ls { path: String },

    /// Print a value
    Cat { path: String },

    /// Print status
    Stat { path: String },
}

impl BrowseCommand {
    pub fn path(&self) -> &str {
        match self {
            BrowseCommand::Ls { path }
            | BrowseCommand::Cat { path }
            | BrowseCommand::Stat { path } => path,
        }
    }
}

/// Parser for command words taken from the command line
pub struct BrowseCommandParser;

impl BrowseCommandParser {
    /// Parses `words`, the command name followed by its path
    ///
    /// Paths are passed through untouched; registry names may contain
    /// spaces, so the path must be a single word.
    pub fn parse<S: AsRef<str>>(words: &[S]) -> Result<BrowseCommand, CommandError> {
        let Some((name, args)) = words.split_first() else {
            return Err(CommandError::Empty);
        };
        let name = name.as_ref().to_lowercase();

        let path = match args {
            [] => return Err(CommandError::MissingArgument("path".to_string())),
            [path] => path.as_ref().to_string(),
            [_, extra, ..] => {
                return Err(CommandError::UnexpectedArgument(extra.as_ref().to_string()))
            }
        };

        match name.as_str() {
            "ls" | "list" => Ok(BrowseCommand::Ls { path }),
            "cat" => Ok(BrowseCommand::Cat { path }),
            "stat" => Ok(BrowseCommand::Stat { path }),
            _ => Err(CommandError::UnknownCommand(name)),
        }
    }
}
