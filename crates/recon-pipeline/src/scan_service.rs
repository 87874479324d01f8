//! The scan-service contract every tool wrapper implements, grounded on
//! `base_service.py`'s `BaseScanService.execute`.

use async_trait::async_trait;

use recon_bus::Event;

use crate::error::PipelineError;
use crate::stage::Stage;

/// One scan service per tool: handles a fixed set of inbound event names,
/// runs its tool, ingests results, and (typically) publishes downstream
/// events of its own via the [`crate::orchestrator::ScanContext`] it is
/// invoked with.
#[async_trait]
pub trait ScanService: Send + Sync {
    /// Human-readable name, used for logging and dispatch diagnostics.
    fn name(&self) -> &'static str;

    /// The pipeline stage this service's queue belongs to.
    fn stage(&self) -> Stage;

    /// Event names this service is invoked for.
    fn handled_events(&self) -> &'static [&'static str];

    /// Run the service against one inbound event.
    async fn execute(&self, event: Event, ctx: &ScanContext) -> Result<(), PipelineError>;
}

/// Shared collaborators passed to every scan-service invocation.
pub struct ScanContext {
    pub bus: std::sync::Arc<recon_bus::EventBus>,
}

impl ScanContext {
    pub fn new(bus: std::sync::Arc<recon_bus::EventBus>) -> Self {
        Self { bus }
    }

    pub async fn publish(&self, event: &Event) -> Result<(), PipelineError> {
        self.bus.publish(event).await.map_err(PipelineError::from)
    }
}
