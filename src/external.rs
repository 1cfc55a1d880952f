use crate::command::{ExecutionOutcome, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::lexer::ArgumentVector;
use crate::resolver::ResolvedPath;
use log::{debug, info};
use std::io::Write;
use std::os::unix::process::CommandExt;
use std::process::{Command, ExitStatus};

/// Runs a resolved external program to completion.
pub trait Launch {
    /// Start `path` with `argv` (whose first element is the name the user typed),
    /// wait for it to finish and then write one newline to `out`.
    fn run(
        &mut self,
        path: &ResolvedPath,
        argv: &ArgumentVector,
        env: &Environment,
        out: &mut dyn Write,
    ) -> Result<ExecutionOutcome, ShellError>;
}

/// Launches programs as child processes that inherit the standard streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl Launch for ProcessLauncher {
    fn run(
        &mut self,
        path: &ResolvedPath,
        argv: &ArgumentVector,
        env: &Environment,
        out: &mut dyn Write,
    ) -> Result<ExecutionOutcome, ShellError> {
        // A bare name that resolved in the working directory must not go
        // through the PATH lookup `Command` does for slash-less programs.
        let program = env.resolve(path);
        let mut cmd = Command::new(&program);
        if let Some(name) = argv.name() {
            cmd.arg0(name);
        }
        cmd.args(argv.args())
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir);

        let mut child = cmd.spawn().map_err(ShellError::LaunchFailure)?;
        debug!("started {} as pid {}", program.display(), child.id());
        let exit_status = child.wait().map_err(ShellError::LaunchFailure)?;

        out.write_all(b"\n")
            .and_then(|()| out.flush())
            .map_err(ShellError::Output)?;

        let status = match exit_status.code() {
            Some(x) => x,
            None => terminated_by_signal(exit_status),
        };
        if status != 0 {
            info!("{} exited with status {status}", program.display());
        }
        Ok(ExecutionOutcome::new(status))
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}
