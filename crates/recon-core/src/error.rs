//! Error taxonomy shared by the process supervisor and tool-runner layer.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by [`crate::supervisor::ProcessSupervisor`] and tool adapters.
///
/// Mirrors the taxonomy in the system design: `ToolNotFound`,
/// `ScanExecutionFailed`, `ScanTimedOut`, and `Cancelled` are all surfaced to
/// the caller. `ParseSkip` is deliberately absent here — a malformed output
/// line never raises, it is dropped and logged at debug by the tool adapter.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("scan execution failed: {message}")]
    ScanExecutionFailed { message: String },

    #[error("scan timed out after {0:?}")]
    ScanTimedOut(Duration),

    #[error("scan cancelled")]
    Cancelled,
}

/// Terminal status of a single process invocation, produced once the child
/// has been reaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalStatus {
    /// Exit code 0.
    Ok,
    /// Non-zero exit code, with the last `stderr_tail` bytes for context.
    Failed { code: i32, stderr_tail: String },
    /// The binary could not be located / spawned.
    ToolNotFound { path: String },
    /// Wall-clock timeout was exceeded; the process was terminated.
    TimedOut { duration: Duration },
    /// External cancellation was requested; the process was terminated.
    Cancelled,
}

impl TerminalStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, TerminalStatus::Ok)
    }
}

impl From<TerminalStatus> for Option<RunnerError> {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::Ok => None,
            TerminalStatus::Failed { code, stderr_tail } => {
                Some(RunnerError::ScanExecutionFailed {
                    message: format!("exit code {code}: {stderr_tail}"),
                })
            }
            TerminalStatus::ToolNotFound { path } => Some(RunnerError::ToolNotFound(path)),
            TerminalStatus::TimedOut { duration } => Some(RunnerError::ScanTimedOut(duration)),
            TerminalStatus::Cancelled => Some(RunnerError::Cancelled),
        }
    }
}
