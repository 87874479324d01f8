use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("bus error: {0}")]
    Bus(#[from] recon_bus::BusError),

    #[error("tool runner error: {0}")]
    Runner(#[from] recon_core::error::RunnerError),

    #[error("no scan service registered for event '{0}'")]
    NoServiceForEvent(String),
}
