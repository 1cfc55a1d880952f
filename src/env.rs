use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// User-level view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: overrides layered on top of the live process environment; they are
///   also passed to every launched child.
/// - `current_dir`: the working directory for command execution and for
///   resolving relative file names.
///
/// Lookups that miss `vars` read the process environment at call time, so a
/// variable such as `PATH` is never cached between commands.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Variables that take precedence over the process environment.
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Start with no overrides and the process's current directory.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars: HashMap::new(),
            current_dir,
        }
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Current search-path value, or `None` when `PATH` is unset.
    pub fn search_path(&self) -> Option<OsString> {
        self.vars
            .get("PATH")
            .map(OsString::from)
            .or_else(|| stdenv::var_os("PATH"))
    }

    /// Interpret `path` relative to the working directory. Absolute paths are
    /// returned unchanged.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.current_dir.join(path)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
