//! Reconnaissance orchestrator: ties the staged event bus, tool-runner
//! framework, and batch-ingestion pipeline into a runnable service.

pub mod config;

#[cfg(feature = "server")]
pub mod api;

pub use config::OrchestratorConfig;

/// Initialize structured logging the way every teacher binary does it:
/// `tracing_subscriber::fmt` with an env-filter, defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();
}
