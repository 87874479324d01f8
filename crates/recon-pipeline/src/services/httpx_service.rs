//! `httpx_scan_requested` -> run httpx, upsert the resolved IP/service and
//! its detected technologies, emit `host_discovered`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_stream::StreamExt;

use std::collections::HashMap;

use recon_bus::Event;
use recon_core::error::RunnerError;
use recon_core::tool_runner::ToolPathResolver;
use recon_core::Id;
use recon_ingest::{ingest, BatchIngestor, BatchOutcome};
use recon_store::repositories::{IpAddressRepository, NewService, ServiceRepository};
use recon_store::{Repository, StoreError, UnitOfWork};
use recon_tools::httpx::{HttpxAdapter, HttpxResult};

use crate::error::PipelineError;
use crate::scan_service::{ScanContext, ScanService};
use crate::stage::Stage;
use crate::target_extraction::extract_targets;
use crate::traits::UrlFilter;

pub struct HttpxScanService {
    pub pool: sqlx::PgPool,
    pub resolver: Arc<dyn ToolPathResolver>,
    pub timeout: Duration,
}

impl UrlFilter for HttpxScanService {}

fn execution_failed(err: impl ToString) -> PipelineError {
    PipelineError::Runner(RunnerError::ScanExecutionFailed { message: err.to_string() })
}

#[async_trait]
impl ScanService for HttpxScanService {
    fn name(&self) -> &'static str {
        "httpx"
    }

    fn stage(&self) -> Stage {
        Stage::Analysis
    }

    fn handled_events(&self) -> &'static [&'static str] {
        &["httpx_scan_requested"]
    }

    async fn execute(&self, event: Event, ctx: &ScanContext) -> Result<(), PipelineError> {
        let targets: Vec<String> =
            extract_targets(&event).into_iter().filter(|t| self.keep_url(t)).collect();
        if targets.is_empty() {
            tracing::debug!("httpx_scan_requested carried no targets, skipping");
            return Ok(());
        }
        let Some(program_id) = event.program_id.as_deref().and_then(|s| Id::from_str(s).ok()) else {
            tracing::warn!("httpx_scan_requested missing program_id, skipping");
            return Ok(());
        };

        let output = recon_core::tool_runner::ToolRunner::run(
            HttpxAdapter,
            self.resolver.as_ref(),
            targets,
            self.timeout,
        )
        .await
        .map_err(PipelineError::Runner)?;

        let results: Vec<HttpxResult> = output.into_stream().collect().await;
        let hosts: Vec<String> = results.iter().map(|r| r.host.clone()).collect();

        let mut uow = UnitOfWork::begin(&self.pool).await.map_err(execution_failed)?;
        let ingestor = HttpxIngestor;
        let result = ingest(&ingestor, &mut uow, program_id, results)
            .await
            .map_err(execution_failed)?;
        uow.commit().await.map_err(execution_failed)?;

        tracing::info!(created = result.created_services, total = result.total, "httpx ingest complete");

        for host in hosts {
            let mut downstream = Event::new("host_discovered")
                .with_target(host.clone())
                .with_source("httpx")
                .with_confidence(0.6)
                .with_program_id(program_id.to_string());
            downstream.extra.insert("hosts".to_string(), json!([host]));
            ctx.publish(&downstream).await?;
        }

        Ok(())
    }
}

struct HttpxIngestor;

#[async_trait]
impl BatchIngestor for HttpxIngestor {
    type Record = HttpxResult;

    async fn process_batch(
        &self,
        uow: &mut UnitOfWork,
        program_id: Id,
        batch: &[Self::Record],
    ) -> Result<BatchOutcome, StoreError> {
        let ip_items: Vec<(String, String, bool)> =
            batch.iter().map(|r| (r.primary_ip.clone(), "v4".to_string(), true)).collect();
        let ips = IpAddressRepository::bulk_upsert(uow, program_id, &ip_items).await?;
        let ip_by_address: HashMap<&str, Id> = ips.iter().map(|ip| (ip.address.as_str(), ip.id)).collect();

        let new_services: Vec<NewService> = batch
            .iter()
            .filter_map(|record| {
                let ip_id = *ip_by_address.get(record.primary_ip.as_str())?;
                Some(NewService {
                    ip_id,
                    scheme: record.scheme.clone(),
                    port: record.port,
                    technologies: record.technologies.clone(),
                })
            })
            .collect();

        let port_pairs: Vec<(Id, i32)> = new_services.iter().map(|s| (s.ip_id, s.port)).collect();
        let existing_ports = ServiceRepository::existing_ports(uow, &port_pairs).await?;

        let created = new_services.iter().filter(|s| !existing_ports.contains(&(s.ip_id, s.port))).count();
        ServiceRepository::bulk_upsert(uow, new_services).await?;

        Ok(BatchOutcome { created_services: created, ..Default::default() })
    }
}
