/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Result of running an external program to completion.
///
/// Only programs that actually started end up here. A failed spawn or exec is
/// reported as [`ShellError::LaunchFailure`](crate::error::ShellError::LaunchFailure)
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub status: ExitCode,
}

impl ExecutionOutcome {
    pub fn new(status: ExitCode) -> Self {
        Self { status }
    }
}
