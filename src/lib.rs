//! A small interactive command interpreter with built-in file utilities.
//!
//! Each line read from standard input is split on whitespace into an argument
//! vector. The first token names either an internal command (`show`, `copy`,
//! `append`, `count`, `delete`, `info`, `list`) that runs inside the process, or
//! an external program that is looked up in the working directory and then on
//! `PATH` and run as a child process. The loop ends on end of input or on a line
//! starting with the exit directive.
//!
//! The main entry point is [`Interpreter`]. Configuration lives in [`Config`],
//! which can be built from command-line flags via [`CliArgs`].

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
mod fileutil;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod logger;
pub mod registry;
pub mod resolver;

pub use config::{CliArgs, Config};
pub use error::ShellError;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
