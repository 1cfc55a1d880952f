use crate::command::ExitCode;
use crate::env::Environment;
use crate::fileutil;
use anyhow::{Context, Result};
use argh::FromArgs;
use std::io::Write;
use std::path::Path;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "show" or "copy".
    fn name() -> &'static str;

    /// Executes the command using provided output streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, stderr: &mut dyn Write, env: &Environment) -> Result<ExitCode>;
}

#[derive(FromArgs, Debug, PartialEq, Eq)]
/// Display the contents of a file on standard output.
pub struct Show {
    #[argh(positional)]
    /// the file to display.
    pub file: String,
}

impl BuiltinCommand for Show {
    fn name() -> &'static str {
        "show"
    }

    fn execute(self, stdout: &mut dyn Write, _stderr: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
        fileutil::show_file(&env.resolve(&self.file), stdout)
            .with_context(|| format!("cannot show '{}'", self.file))?;
        stdout.flush()?;
        Ok(0)
    }
}

#[derive(FromArgs, Debug, PartialEq, Eq)]
/// Create a copy of a file.
/// Without a destination the copy is written next to the source as <file>.copia.
pub struct CopyFile {
    #[argh(positional)]
    /// the file to copy.
    pub file: String,

    #[argh(positional)]
    /// name of the copy (optional).
    pub dest: Option<String>,
}

impl BuiltinCommand for CopyFile {
    fn name() -> &'static str {
        "copy"
    }

    fn execute(self, _stdout: &mut dyn Write, _stderr: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
        let src = env.resolve(&self.file);
        let dest = match &self.dest {
            Some(dest) => env.resolve(dest),
            None => fileutil::default_copy_destination(&src),
        };
        fileutil::copy_file(&src, &dest)
            .with_context(|| format!("cannot copy '{}' to '{}'", self.file, dest.display()))?;
        Ok(0)
    }
}

#[derive(FromArgs, Debug, PartialEq, Eq)]
/// Append the contents of one file to another, existing file.
pub struct Append {
    #[argh(positional)]
    /// the file with the contents to append.
    pub source: String,

    #[argh(positional)]
    /// the file the contents are appended to.
    pub destination: String,
}

impl BuiltinCommand for Append {
    fn name() -> &'static str {
        "append"
    }

    fn execute(self, _stdout: &mut dyn Write, _stderr: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
        fileutil::append_file(&env.resolve(&self.source), &env.resolve(&self.destination))
            .with_context(|| format!("cannot append '{}' to '{}'", self.source, self.destination))?;
        Ok(0)
    }
}

#[derive(FromArgs, Debug, PartialEq, Eq)]
/// Count the number of lines a file contains.
pub struct Count {
    #[argh(positional)]
    /// the file to count.
    pub file: String,
}

impl BuiltinCommand for Count {
    fn name() -> &'static str {
        "count"
    }

    fn execute(self, stdout: &mut dyn Write, _stderr: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
        let lines = fileutil::count_lines(&env.resolve(&self.file))
            .with_context(|| format!("cannot count lines of '{}'", self.file))?;
        writeln!(stdout, "{lines}")?;
        Ok(0)
    }
}

#[derive(FromArgs, Debug, PartialEq, Eq)]
/// Delete a file.
pub struct Delete {
    #[argh(positional)]
    /// the file to delete.
    pub file: String,
}

impl BuiltinCommand for Delete {
    fn name() -> &'static str {
        "delete"
    }

    fn execute(self, _stdout: &mut dyn Write, _stderr: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
        fileutil::delete_file(&env.resolve(&self.file))
            .with_context(|| format!("cannot delete '{}'", self.file))?;
        Ok(0)
    }
}

#[derive(FromArgs, Debug, PartialEq, Eq)]
/// Display type, owner, inode and timestamps of a file.
pub struct Info {
    #[argh(positional)]
    /// the file to describe.
    pub file: String,
}

impl BuiltinCommand for Info {
    fn name() -> &'static str {
        "info"
    }

    fn execute(self, stdout: &mut dyn Write, _stderr: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
        let info = fileutil::file_info(&self.file, &env.resolve(&self.file))
            .with_context(|| format!("cannot read information for '{}'", self.file))?;
        write!(stdout, "{info}")?;
        Ok(0)
    }
}

#[derive(FromArgs, Debug, PartialEq, Eq)]
/// List the contents of a directory.
/// If no argument is given, defaults to the current directory.
pub struct List {
    #[argh(positional)]
    /// the directory to list (optional).
    pub dir: Option<String>,
}

impl BuiltinCommand for List {
    fn name() -> &'static str {
        "list"
    }

    fn execute(self, stdout: &mut dyn Write, stderr: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
        let label = self.dir.as_deref().unwrap_or(".");
        fileutil::list_dir(label, &env.resolve(Path::new(label)), stdout, stderr)
            .with_context(|| format!("cannot list directory '{label}'"))?;
        Ok(0)
    }
}

/// A parsed internal command, ready to run.
#[derive(Debug, PartialEq, Eq)]
pub enum Builtin {
    Show(Show),
    Copy(CopyFile),
    Append(Append),
    Count(Count),
    Delete(Delete),
    Info(Info),
    List(List),
}

impl Builtin {
    pub fn execute(self, stdout: &mut dyn Write, stderr: &mut dyn Write, env: &Environment) -> Result<ExitCode> {
        match self {
            Builtin::Show(cmd) => cmd.execute(stdout, stderr, env),
            Builtin::Copy(cmd) => cmd.execute(stdout, stderr, env),
            Builtin::Append(cmd) => cmd.execute(stdout, stderr, env),
            Builtin::Count(cmd) => cmd.execute(stdout, stderr, env),
            Builtin::Delete(cmd) => cmd.execute(stdout, stderr, env),
            Builtin::Info(cmd) => cmd.execute(stdout, stderr, env),
            Builtin::List(cmd) => cmd.execute(stdout, stderr, env),
        }
    }
}
