//! Process Supervisor (C1): spawns a child, streams stdout line-by-line,
//! enforces a timeout, propagates cancellation, and translates exit
//! conditions into typed terminal statuses.
//!
//! Grounded on the stdio-plumbing shape in sidecar process spawners: piped
//! stdin/stdout/stderr via `tokio::process`, stderr drained by a background
//! task, stdin written once then dropped to close it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::error::TerminalStatus;
use crate::stderr_ring::StderrRing;

/// Grace window between SIGTERM and SIGKILL during escalated termination.
const TERMINATION_GRACE: Duration = Duration::from_secs(5);

/// A single invocation spec for the supervisor.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub path: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub timeout: Duration,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

impl ProcessSpec {
    pub fn new(path: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            args,
            stdin: None,
            timeout,
            cwd: None,
            env: HashMap::new(),
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// One decoded stdout line, or the terminal status once the child exits.
#[derive(Debug)]
pub enum ProcessEvent {
    Line(String),
    Done(TerminalStatus),
}

/// A live, streaming handle to a spawned child process.
pub struct ProcessHandle {
    rx: mpsc::Receiver<ProcessEvent>,
    cancel_tx: watch::Sender<bool>,
}

impl ProcessHandle {
    /// Receive the next line or the terminal status. Returns `None` once the
    /// terminal status has already been delivered.
    pub async fn recv(&mut self) -> Option<ProcessEvent> {
        self.rx.recv().await
    }

    /// Request cancellation. The supervisor task will escalate
    /// SIGTERM -> grace -> SIGKILL -> reap and deliver `Cancelled`.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Spawns and supervises external tool processes.
pub struct ProcessSupervisor;

impl ProcessSupervisor {
    /// Spawn `spec` and return a handle streaming its stdout lines.
    ///
    /// The returned handle yields `ProcessEvent::Line` for each decoded
    /// stdout line (decode errors are replaced, never raised) followed by
    /// exactly one `ProcessEvent::Done` carrying the terminal status.
    pub async fn run(spec: ProcessSpec) -> ProcessHandle {
        let (tx, rx) = mpsc::channel(1024);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        tokio::spawn(Self::drive(spec, tx, cancel_rx));

        ProcessHandle { rx, cancel_tx }
    }

    async fn drive(
        spec: ProcessSpec,
        tx: mpsc::Sender<ProcessEvent>,
        mut cancel_rx: watch::Receiver<bool>,
    ) {
        let mut cmd = Command::new(&spec.path);
        cmd.args(&spec.args)
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &spec.env {
            cmd.env(k, v);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let _ = tx
                    .send(ProcessEvent::Done(TerminalStatus::ToolNotFound {
                        path: spec.path.clone(),
                    }))
                    .await;
                return;
            }
            Err(e) => {
                let _ = tx
                    .send(ProcessEvent::Done(TerminalStatus::Failed {
                        code: -1,
                        stderr_tail: format!("spawn failed: {e}"),
                    }))
                    .await;
                return;
            }
        };

        if let Some(input) = &spec.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    tracing::warn!(tool = %spec.path, error = %e, "failed writing stdin");
                }
                // Dropping `stdin` closes the pipe so the child sees EOF.
            }
        }

        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let stderr_ring = std::sync::Arc::new(tokio::sync::Mutex::new(StderrRing::new()));
        let stderr_task = tokio::spawn(Self::drain_stderr(stderr, stderr_ring.clone()));

        let mut lines = BufReader::new(stdout).lines();
        let deadline = Instant::now() + spec.timeout;

        let status = loop {
            tokio::select! {
                biased;

                _ = cancel_rx.changed() => {
                    if *cancel_rx.borrow() {
                        Self::terminate(&mut child).await;
                        break TerminalStatus::Cancelled;
                    }
                }

                _ = tokio::time::sleep_until(deadline) => {
                    Self::terminate(&mut child).await;
                    break TerminalStatus::TimedOut { duration: spec.timeout };
                }

                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if tx.send(ProcessEvent::Line(line)).await.is_err() {
                                // Consumer dropped the handle — terminate the child.
                                Self::terminate(&mut child).await;
                                break TerminalStatus::Cancelled;
                            }
                        }
                        Ok(None) => {
                            // EOF on stdout — wait for exit.
                            match child.wait().await {
                                Ok(exit) if exit.success() => break TerminalStatus::Ok,
                                Ok(exit) => {
                                    let tail = stderr_ring.lock().await.tail();
                                    break TerminalStatus::Failed {
                                        code: exit.code().unwrap_or(-1),
                                        stderr_tail: tail,
                                    };
                                }
                                Err(e) => {
                                    break TerminalStatus::Failed {
                                        code: -1,
                                        stderr_tail: format!("wait failed: {e}"),
                                    };
                                }
                            }
                        }
                        Err(e) => {
                            tracing::debug!(tool = %spec.path, error = %e, "stdout decode error, line dropped");
                        }
                    }
                }
            }
        };

        let _ = stderr_task.await;
        let _ = tx.send(ProcessEvent::Done(status)).await;
    }

    async fn drain_stderr(
        stderr: tokio::process::ChildStderr,
        ring: std::sync::Arc<tokio::sync::Mutex<StderrRing>>,
    ) {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            ring.lock().await.push_line(&line);
        }
    }

    /// Escalated termination: SIGTERM, grace window, then SIGKILL, then reap.
    async fn terminate(child: &mut Child) {
        #[cfg(unix)]
        if let Some(pid) = child.id() {
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            let graced = tokio::time::timeout(TERMINATION_GRACE, child.wait()).await;
            if graced.is_ok() {
                return;
            }
        }

        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_yields_tool_not_found() {
        let spec = ProcessSpec::new("/definitely/not/a/real/binary", vec![], Duration::from_secs(5));
        let mut handle = ProcessSupervisor::run(spec).await;
        let mut saw_not_found = false;
        while let Some(event) = handle.recv().await {
            if let ProcessEvent::Done(TerminalStatus::ToolNotFound { .. }) = event {
                saw_not_found = true;
            }
        }
        assert!(saw_not_found);
    }

    #[tokio::test]
    async fn successful_exit_yields_ok() {
        let spec = ProcessSpec::new("/bin/echo", vec!["hello".into()], Duration::from_secs(5));
        let mut handle = ProcessSupervisor::run(spec).await;
        let mut lines = Vec::new();
        let mut status = None;
        while let Some(event) = handle.recv().await {
            match event {
                ProcessEvent::Line(l) => lines.push(l),
                ProcessEvent::Done(s) => status = Some(s),
            }
        }
        assert_eq!(lines, vec!["hello".to_string()]);
        assert_eq!(status, Some(TerminalStatus::Ok));
    }

    #[tokio::test]
    async fn timeout_at_first_line_yields_timed_out_with_zero_records() {
        let spec = ProcessSpec::new(
            "/bin/sleep",
            vec!["5".into()],
            Duration::from_millis(50),
        );
        let mut handle = ProcessSupervisor::run(spec).await;
        let mut lines = Vec::new();
        let mut status = None;
        while let Some(event) = handle.recv().await {
            match event {
                ProcessEvent::Line(l) => lines.push(l),
                ProcessEvent::Done(s) => status = Some(s),
            }
        }
        assert!(lines.is_empty());
        assert!(matches!(status, Some(TerminalStatus::TimedOut { .. })));
    }

    #[tokio::test]
    async fn cancellation_terminates_the_child() {
        let spec = ProcessSpec::new("/bin/sleep", vec!["5".into()], Duration::from_secs(30));
        let mut handle = ProcessSupervisor::run(spec).await;
        handle.cancel();
        let mut status = None;
        while let Some(event) = handle.recv().await {
            if let ProcessEvent::Done(s) = event {
                status = Some(s);
            }
        }
        assert_eq!(status, Some(TerminalStatus::Cancelled));
    }
}
