use crate::env::Environment;
use crate::error::ShellError;
use log::debug;
use std::ffi::{CString, OsStr};
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// Decides whether a path names something that can be executed.
pub trait AccessCheck {
    fn is_executable(&self, path: &Path) -> bool;
}

/// Regular file the current user may execute, as decided by `access(2)`.
///
/// Any error while reading metadata (missing file, unreadable directory on the
/// way) simply means "not executable".
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecutableFile;

impl AccessCheck for ExecutableFile {
    fn is_executable(&self, path: &Path) -> bool {
        let is_file = fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false);
        is_file && may_execute(path)
    }
}

fn may_execute(path: &Path) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}

/// Program location produced by [`Resolver::resolve`].
///
/// Either the name exactly as typed, when it was directly executable relative
/// to the working directory, or `<directory>/<name>` from the search path.
/// The file may have changed by the time it is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Locates external programs by name.
pub struct Resolver {
    access: Box<dyn AccessCheck>,
}

impl Resolver {
    pub fn new(access: Box<dyn AccessCheck>) -> Self {
        Self { access }
    }

    /// Resolve `name` against the environment's working directory and its
    /// current `PATH`, read afresh on every call.
    pub fn resolve(&self, name: &str, env: &Environment) -> Result<ResolvedPath, ShellError> {
        let search_paths = env.search_path();
        self.resolve_in(name, &env.current_dir, search_paths.as_deref())
    }

    /// Resolve `name` the way the interpreter does:
    /// - directly executable relative to `cwd`: returned unchanged, `search_paths`
    ///   is never consulted;
    /// - otherwise each non-empty entry of `search_paths` is tried in order and
    ///   the first executable `<dir>/<name>` wins;
    /// - `None` for `search_paths` behaves like an empty list.
    pub fn resolve_in(
        &self,
        name: &str,
        cwd: &Path,
        search_paths: Option<&OsStr>,
    ) -> Result<ResolvedPath, ShellError> {
        if name.is_empty() {
            return Err(ShellError::NotFound(String::new()));
        }

        if self.access.is_executable(&cwd.join(name)) {
            debug!("{name}: executable relative to {}", cwd.display());
            return Ok(ResolvedPath(PathBuf::from(name)));
        }

        let found = search_paths.and_then(|paths| find_in_path(&*self.access, paths, name));
        match found {
            Some(path) => {
                debug!("{name}: found at {}", path.display());
                Ok(ResolvedPath(path))
            }
            None => {
                debug!("{name}: not found in search path");
                Err(ShellError::NotFound(name.to_string()))
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Box::new(ExecutableFile))
    }
}

fn find_in_path(access: &dyn AccessCheck, search_paths: &OsStr, cmd: &str) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(cmd))
        .find(|candidate| access.is_executable(candidate))
}
