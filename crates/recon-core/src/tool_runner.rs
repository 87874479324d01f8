//! Tool Runner (C2): the uniform contract every external scanner adapter
//! implements on top of the Process Supervisor.

use std::time::Duration;

use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

use crate::error::TerminalStatus;
use crate::supervisor::{ProcessEvent, ProcessSpec, ProcessSupervisor};

/// Default tool timeout, per the concurrency model (clamped 1..3600s).
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Clamp a requested timeout into the allowed `1..=3600` second range.
pub fn clamp_timeout(requested: Duration) -> Duration {
    let secs = requested.as_secs().clamp(1, 3600);
    Duration::from_secs(secs)
}

/// How a tool adapter feeds its targets to the child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Targets are passed as argv.
    Argv,
    /// Targets are written to stdin, one per line, then stdin is closed.
    Stdin,
}

/// A single line of tool output, parsed (or not) into a typed record.
///
/// `ParseSkip` is not an error: malformed lines are dropped with a debug
/// log, never raised, per the error taxonomy.
pub enum ParseOutcome<T> {
    Record(T),
    ParseSkip { line: String, reason: String },
}

/// Per-tool adapter: builds argv, declares its input mode, and parses each
/// output line into a typed raw record.
pub trait ToolAdapter: Send + Sync + 'static {
    type Record: Send + 'static;

    /// Human-readable tool name, used for the tool-path lookup and logging.
    fn name(&self) -> &'static str;

    /// Build the argv (excluding the binary path itself) for `targets`.
    fn build_args(&self, targets: &[String]) -> Vec<String>;

    /// Whether targets are passed via argv or piped to stdin.
    fn input_mode(&self) -> InputMode;

    /// Parse a single stdout line into a record, or skip it.
    fn parse_line(&self, line: &str) -> ParseOutcome<Self::Record>;
}

/// Resolves a tool name to its binary path.
pub trait ToolPathResolver: Send + Sync {
    fn resolve(&self, tool_name: &str) -> Option<String>;
}

/// A simple in-memory tool-path table, populated from configuration.
#[derive(Debug, Clone, Default)]
pub struct ToolPathTable {
    paths: std::collections::HashMap<String, String>,
}

impl ToolPathTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: impl Into<String>, path: impl Into<String>) -> Self {
        self.paths.insert(tool.into(), path.into());
        self
    }
}

impl ToolPathResolver for ToolPathTable {
    fn resolve(&self, tool_name: &str) -> Option<String> {
        self.paths.get(tool_name).cloned()
    }
}

/// Runs a [`ToolAdapter`] against a list of targets and yields a lazy
/// sequence of parsed records. Terminal status is reported via the returned
/// `JoinHandle`'s result channel; malformed lines are silently dropped.
pub struct ToolRunner;

impl ToolRunner {
    pub async fn run<A: ToolAdapter>(
        adapter: A,
        resolver: &dyn ToolPathResolver,
        targets: Vec<String>,
        timeout: Duration,
    ) -> Result<ToolRunOutput<A::Record>, crate::error::RunnerError> {
        let path = resolver
            .resolve(adapter.name())
            .ok_or_else(|| crate::error::RunnerError::ToolNotFound(adapter.name().to_string()))?;

        let args = match adapter.input_mode() {
            InputMode::Argv => adapter.build_args(&targets),
            InputMode::Stdin => adapter.build_args(&[]),
        };

        let mut spec = ProcessSpec::new(path, args, clamp_timeout(timeout));
        if adapter.input_mode() == InputMode::Stdin {
            spec = spec.with_stdin(targets.join("\n"));
        }

        let mut handle = ProcessSupervisor::run(spec).await;
        let (tx, rx) = tokio::sync::mpsc::channel(1024);
        let status_slot = std::sync::Arc::new(tokio::sync::Mutex::new(None));
        let status_slot_task = status_slot.clone();

        tokio::spawn(async move {
            while let Some(event) = handle.recv().await {
                match event {
                    ProcessEvent::Line(line) => match adapter.parse_line(&line) {
                        ParseOutcome::Record(record) => {
                            if tx.send(record).await.is_err() {
                                break;
                            }
                        }
                        ParseOutcome::ParseSkip { line, reason } => {
                            tracing::debug!(tool = adapter.name(), %line, %reason, "skipping malformed line");
                        }
                    },
                    ProcessEvent::Done(status) => {
                        *status_slot_task.lock().await = Some(status);
                    }
                }
            }
        });

        Ok(ToolRunOutput {
            records: ReceiverStream::new(rx),
            status: status_slot,
        })
    }
}

/// The lazy record stream plus a slot that is populated with the terminal
/// status once the underlying process exits.
pub struct ToolRunOutput<T> {
    pub records: ReceiverStream<T>,
    status: std::sync::Arc<tokio::sync::Mutex<Option<TerminalStatus>>>,
}

impl<T> ToolRunOutput<T> {
    pub fn into_stream(self) -> impl Stream<Item = T> {
        self.records
    }

    pub async fn terminal_status(&self) -> Option<TerminalStatus> {
        self.status.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAdapter;

    impl ToolAdapter for EchoAdapter {
        type Record = String;

        fn name(&self) -> &'static str {
            "echo"
        }

        fn build_args(&self, targets: &[String]) -> Vec<String> {
            targets.to_vec()
        }

        fn input_mode(&self) -> InputMode {
            InputMode::Argv
        }

        fn parse_line(&self, line: &str) -> ParseOutcome<Self::Record> {
            if line.is_empty() {
                ParseOutcome::ParseSkip {
                    line: line.to_string(),
                    reason: "empty".to_string(),
                }
            } else {
                ParseOutcome::Record(line.to_string())
            }
        }
    }

    #[tokio::test]
    async fn runs_adapter_and_collects_records() {
        use futures::StreamExt;

        let resolver = ToolPathTable::new().with("echo", "/bin/echo");
        let output = ToolRunner::run(
            EchoAdapter,
            &resolver,
            vec!["a".into(), "b".into()],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        let records: Vec<String> = output.records.collect().await;
        assert_eq!(records, vec!["a b".to_string()]);
    }

    #[test]
    fn clamps_out_of_range_timeouts() {
        assert_eq!(clamp_timeout(Duration::from_secs(0)), Duration::from_secs(1));
        assert_eq!(
            clamp_timeout(Duration::from_secs(999_999)),
            Duration::from_secs(3600)
        );
        assert_eq!(clamp_timeout(Duration::from_secs(60)), Duration::from_secs(60));
    }
}
