use crate::command::ExitCode;
use crate::config::Config;
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::{Launch, ProcessLauncher};
use crate::io_adapters::{EditorSource, LineSource, StreamSource};
use crate::lexer::{self, ArgumentVector};
use crate::registry::{CommandKind, Registry};
use crate::resolver::Resolver;
use argh::EarlyExit;
use log::{debug, warn};
use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

/// What the loop does after handling one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Prompt,
    Exit,
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// Internal commands come from an immutable [`Registry`] and are checked first;
/// any other name is looked up by the [`Resolver`] and started through a
/// [`Launch`] implementation. The interpreter never runs two commands at once.
///
/// Example
/// ```no_run
/// use unix_cli::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.run("count", &["Cargo.toml"]).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    config: Config,
    env: Environment,
    registry: Registry,
    resolver: Resolver,
    launcher: Box<dyn Launch>,
}

impl Interpreter {
    /// Create a new interpreter from explicit parts.
    pub fn new(config: Config, registry: Registry, resolver: Resolver, launcher: Box<dyn Launch>) -> Self {
        Self {
            config,
            env: Environment::new(),
            registry,
            resolver,
            launcher,
        }
    }

    /// Default parts with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self::new(
            config,
            Registry::builtin(),
            Resolver::default(),
            Box::new(ProcessLauncher),
        )
    }

    /// Replace the environment captured at construction.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Output goes to the process's standard streams. Returns the command's exit
    /// code, or the error that kept it from running.
    pub fn run(&mut self, name: &str, args: &[&str]) -> Result<ExitCode, ShellError> {
        let argv: ArgumentVector = std::iter::once(name).chain(args.iter().copied()).collect();
        self.dispatch(&argv, &mut io::stdout(), &mut io::stderr())
    }

    /// Interactive session on the process's standard streams.
    ///
    /// A terminal gets the line editor; anything else is read line by line.
    /// Returns `Ok(())` on the exit directive or end of input.
    pub fn repl(&mut self) -> Result<(), ShellError> {
        let max_line_bytes = self.config.max_line_bytes;
        let mut stdout = io::stdout();
        let mut stderr = io::stderr();

        if io::stdin().is_terminal() {
            match EditorSource::new(max_line_bytes) {
                Ok(mut editor) => return self.run_loop(&mut editor, &mut stdout, &mut stderr),
                Err(e) => warn!("line editor unavailable, reading plain input: {e}"),
            }
        }
        let mut source = StreamSource::new(io::stdin().lock(), max_line_bytes);
        self.run_loop(&mut source, &mut stdout, &mut stderr)
    }

    /// Prompt, read, dispatch until the exit directive, end of input or a fatal
    /// error. Only a fatal error is returned as `Err`; every other one is
    /// reported on `err` and the loop prompts again.
    pub fn run_loop(
        &mut self,
        source: &mut dyn LineSource,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<(), ShellError> {
        loop {
            let line = match source.next_line(&self.config.prompt, out) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("end of input");
                    return Ok(());
                }
                Err(e) => return Err(ShellError::ReadFailure(e)),
            };
            if self.step(&line, out, err)? == Step::Exit {
                debug!("exit directive");
                return Ok(());
            }
        }
    }

    fn step(
        &mut self,
        line: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Step, ShellError> {
        if line.is_empty() {
            return Ok(Step::Prompt);
        }
        if self.config.is_exit_directive(line) {
            return Ok(Step::Exit);
        }
        let argv = lexer::tokenize(line, self.config.max_args);
        if argv.is_empty() {
            return Ok(Step::Prompt);
        }
        match self.dispatch(&argv, out, err) {
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                report(err, &e);
                Ok(Step::Prompt)
            }
            Ok(_) => Ok(Step::Prompt),
        }
    }

    /// Route one command line to an internal handler or to the launcher.
    ///
    /// Internal commands always win over programs of the same name. An empty
    /// vector is a no-op with status 0.
    pub fn dispatch(
        &mut self,
        argv: &ArgumentVector,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        let Some(name) = argv.name() else {
            return Ok(0);
        };

        if let Ok(kind) = self.registry.identify(name).map(|entry| entry.kind) {
            return Ok(self.run_internal(kind, argv, out, err));
        }

        let path = self.resolver.resolve(name, &self.env)?;
        let outcome = self.launcher.run(&path, argv, &self.env, out)?;
        Ok(outcome.status)
    }

    fn run_internal(
        &mut self,
        kind: CommandKind,
        argv: &ArgumentVector,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> ExitCode {
        let args: Vec<&str> = argv.args().iter().map(String::as_str).collect();
        match kind.parse(&args) {
            Ok(builtin) => match builtin.execute(out, err, &self.env) {
                Ok(code) => code,
                Err(e) => {
                    report(err, &format_args!("{}: {e:#}", kind.name()));
                    1
                }
            },
            // --help lands on stdout, usage errors on stderr
            Err(EarlyExit { output, status }) => match status {
                Ok(()) => {
                    report(out, &output.trim_end());
                    0
                }
                Err(()) => {
                    report(err, &output.trim_end());
                    1
                }
            },
        }
    }
}

impl Default for Interpreter {
    /// Every internal command, real executable checks and real child processes.
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

/// Write one diagnostic line. A failure here has nowhere else to go but the log.
fn report(sink: &mut dyn Write, message: &dyn Display) {
    if let Err(e) = writeln!(sink, "{message}").and_then(|()| sink.flush()) {
        warn!("could not write diagnostic: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ExecutionOutcome;
    use crate::resolver::{AccessCheck, ResolvedPath};
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::env as stdenv;
    use std::fs;
    use std::io::{BufReader, Cursor, Read};
    use std::path::{Path, PathBuf};
    use std::rc::Rc;
    use std::time::{SystemTime, UNIX_EPOCH};

    type Calls = Rc<RefCell<Vec<(PathBuf, Vec<String>)>>>;

    /// Records launches instead of starting processes.
    #[derive(Clone, Default)]
    struct RecordingLauncher {
        calls: Calls,
        result: Option<ExitCode>,
    }

    impl Launch for RecordingLauncher {
        fn run(
            &mut self,
            path: &ResolvedPath,
            argv: &ArgumentVector,
            _env: &Environment,
            out: &mut dyn Write,
        ) -> Result<ExecutionOutcome, ShellError> {
            self.calls
                .borrow_mut()
                .push((path.as_path().to_path_buf(), argv.as_slice().to_vec()));
            match self.result {
                Some(status) => {
                    out.write_all(b"\n").map_err(ShellError::Output)?;
                    Ok(ExecutionOutcome::new(status))
                }
                None => Err(ShellError::LaunchFailure(io::Error::from_raw_os_error(
                    libc::ENOEXEC,
                ))),
            }
        }
    }

    #[derive(Clone, Default)]
    struct StubAccess {
        executables: HashSet<PathBuf>,
        probes: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl AccessCheck for StubAccess {
        fn is_executable(&self, path: &Path) -> bool {
            self.probes.borrow_mut().push(path.to_path_buf());
            self.executables.contains(path)
        }
    }

    struct Harness {
        shell: Interpreter,
        calls: Calls,
        probes: Rc<RefCell<Vec<PathBuf>>>,
    }

    fn harness(executables: &[&str], cwd: &Path) -> Harness {
        let access = StubAccess {
            executables: executables.iter().map(PathBuf::from).collect(),
            probes: Rc::default(),
        };
        let launcher = RecordingLauncher {
            result: Some(0),
            ..RecordingLauncher::default()
        };
        let probes = access.probes.clone();
        let calls = launcher.calls.clone();

        let mut env = Environment {
            vars: HashMap::new(),
            current_dir: cwd.to_path_buf(),
        };
        env.set_var("PATH", "/bin:/usr/bin");

        let shell = Interpreter::new(
            Config::default(),
            Registry::builtin(),
            Resolver::new(Box::new(access)),
            Box::new(launcher),
        )
        .with_env(env);
        Harness { shell, calls, probes }
    }

    /// Feed `input` through the loop; returns (stdout, stderr, unread input).
    fn drive(shell: &mut Interpreter, input: &str) -> (String, String, String) {
        let mut source = StreamSource::new(Cursor::new(input.as_bytes().to_vec()), 4096);
        let mut out = Vec::new();
        let mut err = Vec::new();
        shell.run_loop(&mut source, &mut out, &mut err).unwrap();

        let mut rest = String::new();
        source.into_inner().read_to_string(&mut rest).unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
            rest,
        )
    }

    fn make_unique_temp_dir() -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("interpreter_test_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }

    #[test]
    fn test_blank_lines_reprompt_without_dispatch() {
        let mut h = harness(&[], Path::new("/work"));

        let (out, err, _) = drive(&mut h.shell, "\n   \n\t \n");

        assert_eq!(out, "% % % % ");
        assert!(err.is_empty());
        assert!(h.calls.borrow().is_empty());
        assert!(h.probes.borrow().is_empty());
    }

    #[test]
    fn test_exit_directive_stops_reading() {
        for input in ["termina\nls\n", "terminate now\nls\n"] {
            let mut h = harness(&["/bin/ls"], Path::new("/work"));

            let (out, err, rest) = drive(&mut h.shell, input);

            assert_eq!(out, "% ");
            assert!(err.is_empty());
            assert_eq!(rest, "ls\n");
            assert!(h.calls.borrow().is_empty());
        }
    }

    #[test]
    fn test_end_of_input_is_clean_termination() {
        let mut h = harness(&[], Path::new("/work"));
        let (out, err, _) = drive(&mut h.shell, "");
        assert_eq!(out, "% ");
        assert!(err.is_empty());
    }

    #[test]
    fn test_external_command_resolved_from_search_path() {
        let mut h = harness(&["/bin/ls"], Path::new("/work"));

        let (out, err, _) = drive(&mut h.shell, "ls -la\ntermina\n");

        assert_eq!(
            *h.calls.borrow(),
            [(PathBuf::from("/bin/ls"), vec!["ls".to_string(), "-la".to_string()])]
        );
        // prompt, trailing newline after the child, prompt again
        assert_eq!(out, "% \n% ");
        assert!(err.is_empty());
    }

    #[test]
    fn test_unknown_name_reports_not_found_and_continues() {
        let mut h = harness(&["/bin/ls"], Path::new("/work"));

        let (out, err, _) = drive(&mut h.shell, "frobnicate now\nls\n");

        assert_eq!(err, "frobnicate: command not found\n");
        assert_eq!(h.calls.borrow().len(), 1);
        assert_eq!(h.calls.borrow()[0].0, PathBuf::from("/bin/ls"));
        assert_eq!(out, "% % \n% ");
        assert_eq!(
            *h.probes.borrow(),
            [
                PathBuf::from("/work/frobnicate"),
                PathBuf::from("/bin/frobnicate"),
                PathBuf::from("/usr/bin/frobnicate"),
                PathBuf::from("/work/ls"),
                PathBuf::from("/bin/ls"),
            ]
        );
    }

    #[test]
    fn test_directly_executable_name_skips_search_path() {
        let mut h = harness(&["/work/tool", "/bin/tool"], Path::new("/work"));

        drive(&mut h.shell, "tool x\n");

        assert_eq!(*h.probes.borrow(), [PathBuf::from("/work/tool")]);
        assert_eq!(h.calls.borrow()[0].0, PathBuf::from("tool"));
    }

    #[test]
    fn test_internal_command_never_touches_resolver() {
        let dir = make_unique_temp_dir().unwrap();
        fs::write(dir.join("file.txt"), "contents\n").unwrap();
        let mut h = harness(&["/bin/show"], &dir);

        let (out, err, _) = drive(&mut h.shell, "show file.txt\n");

        assert_eq!(out, "% contents\n% ");
        assert!(err.is_empty());
        assert!(h.probes.borrow().is_empty());
        assert!(h.calls.borrow().is_empty());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_internal_command_failure_is_one_diagnostic() {
        let dir = make_unique_temp_dir().unwrap();
        let mut h = harness(&[], &dir);

        let (_, err, _) = drive(&mut h.shell, "count missing.txt\ncount missing.txt\n");

        let lines: Vec<&str> = err.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("count: cannot count lines of 'missing.txt': "));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_internal_help_goes_to_stdout_and_usage_errors_to_stderr() {
        let mut h = harness(&[], Path::new("/work"));
        let mut out = Vec::new();
        let mut err = Vec::new();

        let help: ArgumentVector = ["count", "--help"].into_iter().collect();
        assert_eq!(h.shell.dispatch(&help, &mut out, &mut err).unwrap(), 0);
        assert!(String::from_utf8_lossy(&out).contains("Usage: count"));
        assert!(err.is_empty());

        let bad: ArgumentVector = ["count"].into_iter().collect();
        out.clear();
        assert_eq!(h.shell.dispatch(&bad, &mut out, &mut err).unwrap(), 1);
        assert!(out.is_empty());
        assert!(!err.is_empty());
    }

    #[test]
    fn test_launch_failure_is_reported_and_loop_continues() {
        let access = StubAccess {
            executables: [PathBuf::from("/bin/broken")].into_iter().collect(),
            probes: Rc::default(),
        };
        let launcher = RecordingLauncher::default();
        let calls = launcher.calls.clone();
        let mut env = Environment::new();
        env.current_dir = PathBuf::from("/work");
        env.set_var("PATH", "/bin");
        let mut shell = Interpreter::new(
            Config::default(),
            Registry::builtin(),
            Resolver::new(Box::new(access)),
            Box::new(launcher),
        )
        .with_env(env);

        let (out, err, _) = drive(&mut shell, "broken\nbroken\n");

        assert_eq!(calls.borrow().len(), 2);
        let lines: Vec<&str> = err.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Error executing command: "));
        assert_eq!(out, "% % % ");
    }

    #[test]
    fn test_dispatch_returns_child_status() {
        let access = StubAccess {
            executables: [PathBuf::from("/bin/false")].into_iter().collect(),
            probes: Rc::default(),
        };
        let launcher = RecordingLauncher {
            result: Some(1),
            ..RecordingLauncher::default()
        };
        let mut env = Environment::new();
        env.current_dir = PathBuf::from("/work");
        env.set_var("PATH", "/bin");
        let mut shell = Interpreter::new(
            Config::default(),
            Registry::builtin(),
            Resolver::new(Box::new(access)),
            Box::new(launcher),
        )
        .with_env(env);

        let argv: ArgumentVector = ["false"].into_iter().collect();
        let code = shell.dispatch(&argv, &mut io::sink(), &mut io::sink()).unwrap();
        assert_eq!(code, 1);

        let missing: ArgumentVector = ["nope"].into_iter().collect();
        assert!(matches!(
            shell.dispatch(&missing, &mut io::sink(), &mut io::sink()),
            Err(ShellError::NotFound(_))
        ));
    }

    #[test]
    fn test_tokens_past_max_args_are_dropped() {
        let mut h = harness(&["/bin/echo"], Path::new("/work"));
        h.shell.config.max_args = 2;

        drive(&mut h.shell, "echo a b c\n");

        assert_eq!(
            h.calls.borrow()[0].1,
            vec!["echo".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn test_custom_prompt_and_exit_directive() {
        let mut h = harness(&[], Path::new("/work"));
        h.shell.config.prompt = "$ ".to_string();
        h.shell.config.exit_directive = "quit".to_string();

        let (out, _, rest) = drive(&mut h.shell, "\nquit\ntermina\n");

        assert_eq!(out, "$ $ ");
        assert_eq!(rest, "termina\n");
    }

    /// Fails the way a vanished stdin does, mid-command.
    struct StdinGone;

    impl Launch for StdinGone {
        fn run(
            &mut self,
            _path: &ResolvedPath,
            _argv: &ArgumentVector,
            _env: &Environment,
            _out: &mut dyn Write,
        ) -> Result<ExecutionOutcome, ShellError> {
            Err(ShellError::ReadFailure(io::Error::from(io::ErrorKind::UnexpectedEof)))
        }
    }

    #[test]
    fn test_fatal_dispatch_error_ends_loop() {
        let access = StubAccess {
            executables: [PathBuf::from("/bin/cat")].into_iter().collect(),
            probes: Rc::default(),
        };
        let mut env = Environment::new();
        env.current_dir = PathBuf::from("/work");
        env.set_var("PATH", "/bin");
        let mut shell = Interpreter::new(
            Config::default(),
            Registry::builtin(),
            Resolver::new(Box::new(access)),
            Box::new(StdinGone),
        )
        .with_env(env);
        let mut source = StreamSource::new(Cursor::new(b"cat\ncat\n".to_vec()), 4096);
        let mut err = Vec::new();

        let res = shell.run_loop(&mut source, &mut io::sink(), &mut err);

        assert!(matches!(res, Err(ShellError::ReadFailure(_))));
        assert!(err.is_empty());
        let mut rest = String::new();
        source.into_inner().read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "cat\n");
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "read failed"))
        }
    }

    #[test]
    fn test_read_error_is_fatal() {
        let mut h = harness(&[], Path::new("/work"));
        let mut source = StreamSource::new(BufReader::new(Broken), 4096);

        let res = h.shell.run_loop(&mut source, &mut io::sink(), &mut io::sink());

        match res {
            Err(e @ ShellError::ReadFailure(_)) => assert!(e.is_fatal()),
            other => panic!("expected ReadFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_run_executes_internal_command() {
        let dir = make_unique_temp_dir().unwrap();
        let file = dir.join("lines.txt");
        fs::write(&file, "a\nb\nc\n").unwrap();

        let mut shell = Interpreter::default();
        let code = shell.run("count", &[file.to_str().unwrap()]).unwrap();

        assert_eq!(code, 0);
        let _ = fs::remove_dir_all(dir);
    }
}
