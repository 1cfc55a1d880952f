use crate::builtin::{Append, Builtin, BuiltinCommand, CopyFile, Count, Delete, Info, List, Show};
use crate::error::ShellError;
use argh::{EarlyExit, FromArgs};
use std::collections::BTreeMap;

/// Every internal command the interpreter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Show,
    Copy,
    Append,
    Count,
    Delete,
    Info,
    List,
}

impl CommandKind {
    pub const ALL: [CommandKind; 7] = [
        CommandKind::Show,
        CommandKind::Copy,
        CommandKind::Append,
        CommandKind::Count,
        CommandKind::Delete,
        CommandKind::Info,
        CommandKind::List,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Show => Show::name(),
            CommandKind::Copy => CopyFile::name(),
            CommandKind::Append => Append::name(),
            CommandKind::Count => Count::name(),
            CommandKind::Delete => Delete::name(),
            CommandKind::Info => Info::name(),
            CommandKind::List => List::name(),
        }
    }

    /// Parse hook: turn the arguments after the command name into a runnable
    /// [`Builtin`].
    ///
    /// `--help` and malformed arguments come back as [`EarlyExit`], whose
    /// `status` tells which of the two it was.
    pub fn parse(self, args: &[&str]) -> Result<Builtin, EarlyExit> {
        let name = [self.name()];
        Ok(match self {
            CommandKind::Show => Builtin::Show(Show::from_args(&name, args)?),
            CommandKind::Copy => Builtin::Copy(CopyFile::from_args(&name, args)?),
            CommandKind::Append => Builtin::Append(Append::from_args(&name, args)?),
            CommandKind::Count => Builtin::Count(Count::from_args(&name, args)?),
            CommandKind::Delete => Builtin::Delete(Delete::from_args(&name, args)?),
            CommandKind::Info => Builtin::Info(Info::from_args(&name, args)?),
            CommandKind::List => Builtin::List(List::from_args(&name, args)?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub name: &'static str,
    pub kind: CommandKind,
}

/// Immutable name → command table, built once before the loop starts.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: BTreeMap<&'static str, CommandEntry>,
}

impl Registry {
    /// Registry containing only the given commands.
    pub fn with_commands(kinds: impl IntoIterator<Item = CommandKind>) -> Self {
        let entries = kinds
            .into_iter()
            .map(|kind| {
                let name = kind.name();
                (name, CommandEntry { name, kind })
            })
            .collect();
        Self { entries }
    }

    /// Registry containing every internal command.
    pub fn builtin() -> Self {
        Self::with_commands(CommandKind::ALL)
    }

    /// Exact, case-sensitive lookup.
    pub fn identify(&self, name: &str) -> Result<&CommandEntry, ShellError> {
        self.entries
            .get(name)
            .ok_or_else(|| ShellError::UnknownCommand(name.to_string()))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
