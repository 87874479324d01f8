//! Shared process-supervision and tool-running primitives for the recon
//! orchestrator: every scanner adapter is built on top of this crate.

pub mod domain;
pub mod error;
pub mod stderr_ring;
pub mod supervisor;
pub mod tool_runner;

pub use domain::{
    DnsRecordType, ExecutionStatus, Id, IpVersion, ParamLocation, RootInputKind, RuleAction,
    RuleKind, ScopeRule,
};
pub use error::{RunnerError, TerminalStatus};
pub use supervisor::{ProcessEvent, ProcessHandle, ProcessSpec, ProcessSupervisor};
pub use tool_runner::{
    clamp_timeout, InputMode, ParseOutcome, ToolAdapter, ToolPathResolver, ToolPathTable,
    ToolRunOutput, ToolRunner, DEFAULT_TIMEOUT_SECS,
};
