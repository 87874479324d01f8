//! Subscribes each stage queue to its registered scan services and
//! dispatches inbound events by name. Grounded on the long-poll /
//! dispatch-by-lookup shape of `bpmn_integration::worker::JobWorker`, wired
//! onto the event bus instead of a gRPC job queue.

use std::collections::HashMap;
use std::sync::Arc;

use recon_bus::{BusError, Event, EventBus};

use crate::scan_service::{ScanContext, ScanService};
use crate::stage::Stage;

/// Registry of scan services plus the machinery to subscribe them to their
/// stage queues and dispatch incoming events by name.
pub struct PipelineOrchestrator {
    bus: Arc<EventBus>,
    services_by_event: HashMap<&'static str, Arc<dyn ScanService>>,
}

impl PipelineOrchestrator {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            services_by_event: HashMap::new(),
        }
    }

    /// Register `service` for every event name it declares. Later
    /// registrations for the same event name overwrite earlier ones.
    pub fn register(&mut self, service: Arc<dyn ScanService>) {
        for event_name in service.handled_events() {
            self.services_by_event.insert(event_name, service.clone());
        }
    }

    fn stages_in_use(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = self
            .services_by_event
            .values()
            .map(|s| s.stage())
            .collect();
        stages.sort_by_key(|s| s.queue_name());
        stages.dedup_by_key(|s| s.queue_name());
        stages
    }

    /// Subscribe to every stage queue that has at least one registered
    /// service and dispatch each delivered event to it. Runs until the first
    /// subscription fails or the process is stopped.
    pub async fn run(self: Arc<Self>) -> Result<(), BusError> {
        let stages = self.stages_in_use();
        let mut handles = Vec::new();

        for stage in stages {
            let this = self.clone();
            let bus = self.bus.clone();
            let queue = stage.queue_name();
            handles.push(tokio::spawn(async move {
                bus.subscribe(queue, move |event: Event| {
                    let this = this.clone();
                    async move { this.dispatch(event).await }
                })
                .await
            }));
        }

        for handle in handles {
            handle.await.expect("subscriber task panicked")?;
        }
        Ok(())
    }

    async fn dispatch(&self, event: Event) -> Result<(), BusError> {
        let Some(service) = self.services_by_event.get(event.event.as_str()) else {
            tracing::warn!(event = %event.event, "no scan service registered for event, dropping");
            return Ok(());
        };

        let ctx = ScanContext::new(self.bus.clone());
        if let Err(err) = service.execute(event.clone(), &ctx).await {
            tracing::error!(service = service.name(), event = %event.event, error = %err, "scan service failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use async_trait::async_trait;

    struct NoopService;

    #[async_trait]
    impl ScanService for NoopService {
        fn name(&self) -> &'static str {
            "noop"
        }
        fn stage(&self) -> Stage {
            Stage::Discovery
        }
        fn handled_events(&self) -> &'static [&'static str] {
            &["subdomain_discovered"]
        }
        async fn execute(&self, _event: Event, _ctx: &ScanContext) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    #[test]
    fn registering_a_service_claims_its_stage() {
        // Construction-only test: a real EventBus needs a broker connection,
        // so this only exercises registration bookkeeping.
        let services_by_event: HashMap<&'static str, Arc<dyn ScanService>> = {
            let mut m = HashMap::new();
            let svc: Arc<dyn ScanService> = Arc::new(NoopService);
            for event_name in svc.handled_events() {
                m.insert(*event_name, svc.clone());
            }
            m
        };
        assert!(services_by_event.contains_key("subdomain_discovered"));
        assert_eq!(services_by_event["subdomain_discovered"].stage().queue_name(), "discovery");
    }
}
