use std::io;
use thiserror::Error;

/// Failures surfaced while reading and dispatching command lines.
///
/// Only [`ShellError::ReadFailure`] ends a session. Every other variant is
/// printed as a single diagnostic line and the interpreter prompts again.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The name is not registered as an internal command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Neither the working directory nor any search-path entry holds an
    /// executable file with this name.
    #[error("{0}: command not found")]
    NotFound(String),

    /// The child process could not be created or could not start the program.
    #[error("Error executing command: {0}")]
    LaunchFailure(#[source] io::Error),

    /// Writing interpreter output (prompt separators, diagnostics) failed.
    #[error("Error writing output: {0}")]
    Output(#[source] io::Error),

    /// Standard input could not be read.
    #[error("Error reading input: {0}")]
    ReadFailure(#[source] io::Error),
}

impl ShellError {
    /// Whether the interpreter loop must stop after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::ReadFailure(_))
    }
}
