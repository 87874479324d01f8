//! `subfinder_scan_requested` -> run subfinder, ingest hosts, emit
//! `subdomain_discovered` for every hostname the run produced.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_stream::StreamExt;

use recon_bus::Event;
use recon_core::error::RunnerError;
use recon_core::tool_runner::ToolPathResolver;
use recon_core::Id;
use recon_ingest::{ingest, BatchIngestor, BatchOutcome};
use recon_store::entities::ScopeRuleRow;
use recon_store::repositories::{HostRepository, NewHost, ScopeRuleRepository};
use recon_store::{Repository, StoreError, UnitOfWork};
use recon_tools::subfinder::{SubdomainRecord, SubfinderAdapter};

use crate::error::PipelineError;
use crate::scan_service::{ScanContext, ScanService};
use crate::stage::Stage;
use crate::target_extraction::extract_targets;
use crate::traits::ScopeCheck;

pub struct SubfinderScanService {
    pub pool: sqlx::PgPool,
    pub resolver: Arc<dyn ToolPathResolver>,
    pub timeout: Duration,
}

fn execution_failed(err: impl ToString) -> PipelineError {
    PipelineError::Runner(RunnerError::ScanExecutionFailed { message: err.to_string() })
}

#[async_trait]
impl ScanService for SubfinderScanService {
    fn name(&self) -> &'static str {
        "subfinder"
    }

    fn stage(&self) -> Stage {
        Stage::Discovery
    }

    fn handled_events(&self) -> &'static [&'static str] {
        &["subfinder_scan_requested"]
    }

    async fn execute(&self, event: Event, ctx: &ScanContext) -> Result<(), PipelineError> {
        let Some(domain) = extract_targets(&event).into_iter().next() else {
            tracing::debug!("subfinder_scan_requested carried no target domain, skipping");
            return Ok(());
        };
        let Some(program_id) = event.program_id.as_deref().and_then(|s| Id::from_str(s).ok()) else {
            tracing::warn!("subfinder_scan_requested missing program_id, skipping");
            return Ok(());
        };

        let output = recon_core::tool_runner::ToolRunner::run(
            SubfinderAdapter { domain: domain.clone() },
            self.resolver.as_ref(),
            vec![domain],
            self.timeout,
        )
        .await
        .map_err(PipelineError::Runner)?;

        let records: Vec<SubdomainRecord> = output.into_stream().collect().await;
        let discovered: Vec<String> = records.iter().map(|r| r.hostname.clone()).collect();

        let mut uow = UnitOfWork::begin(&self.pool).await.map_err(execution_failed)?;
        let rules = ScopeRuleRepository::find_by_program(&mut uow, program_id)
            .await
            .map_err(execution_failed)?;

        let ingestor = SubfinderIngestor { rules };
        let result = ingest(&ingestor, &mut uow, program_id, records)
            .await
            .map_err(execution_failed)?;
        uow.commit().await.map_err(execution_failed)?;

        tracing::info!(created = result.created_hosts, total = result.total, "subfinder ingest complete");

        for hostname in discovered {
            let mut downstream = Event::new("subdomain_discovered")
                .with_target(hostname.clone())
                .with_source("subfinder")
                .with_confidence(0.5)
                .with_program_id(program_id.to_string());
            downstream.extra.insert("subdomains".to_string(), json!([hostname]));
            ctx.publish(&downstream).await?;
        }

        Ok(())
    }
}

struct SubfinderIngestor {
    rules: Vec<ScopeRuleRow>,
}

impl ScopeCheck for SubfinderIngestor {}

#[async_trait]
impl BatchIngestor for SubfinderIngestor {
    type Record = SubdomainRecord;

    async fn process_batch(
        &self,
        uow: &mut UnitOfWork,
        program_id: Id,
        batch: &[Self::Record],
    ) -> Result<BatchOutcome, StoreError> {
        let core_rules: Vec<_> = self.rules.iter().filter_map(ScopeRuleRow::to_domain).collect();

        let hostnames: Vec<String> = batch.iter().map(|r| r.hostname.clone()).collect();
        let existing = HostRepository::existing_hostnames(uow, program_id, &hostnames).await?;

        let new_hosts: Vec<NewHost> = batch
            .iter()
            .map(|record| NewHost {
                program_id,
                hostname: record.hostname.clone(),
                in_scope: self.is_in_scope(&record.hostname, &core_rules),
                cname_chain: Vec::new(),
            })
            .collect();

        let created = new_hosts.iter().filter(|h| !existing.contains(&h.hostname)).count();
        HostRepository::bulk_upsert(uow, new_hosts).await?;

        Ok(BatchOutcome { created_hosts: created, ..Default::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_failed_wraps_message() {
        let err = execution_failed("boom");
        assert!(matches!(err, PipelineError::Runner(RunnerError::ScanExecutionFailed { .. })));
    }
}
