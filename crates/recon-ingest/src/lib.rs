//! Batch Ingestor (C6): savepoint-per-batch ingestion of tool-specific raw
//! records into the asset graph, per `base_result_ingestor.py`.

use async_trait::async_trait;
use recon_store::{StoreError, UnitOfWork};

/// Number of records per batch unless a tool overrides it.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Tallies how an ingestion run went. Only *newly created* entities are
/// reported here — existence is rechecked after upsert, so an upsert that
/// only touched an existing row doesn't count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestResult {
    pub total: usize,
    pub ok_batches: usize,
    pub failed_batches: usize,
    pub created_hosts: usize,
    pub created_services: usize,
    pub created_endpoints: usize,
}

/// Tool-specific batch processing logic, supplied by each adapter.
/// `_process_batch` in the original — implementors decide how a batch of
/// `Record`s becomes rows in the asset graph.
#[async_trait]
pub trait BatchIngestor: Send + Sync {
    type Record: Send;

    fn batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }

    /// Process one batch inside an already-open savepoint. Any error here
    /// rolls back to that savepoint only — it never aborts the run.
    async fn process_batch(
        &self,
        uow: &mut UnitOfWork,
        program_id: recon_core::Id,
        batch: &[Self::Record],
    ) -> Result<BatchOutcome, StoreError>;
}

/// Per-batch count of newly created entities, folded into the run's
/// [`IngestResult`].
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub created_hosts: usize,
    pub created_services: usize,
    pub created_endpoints: usize,
}

/// Runs `ingestor` over `records`, opening one Unit of Work for the whole
/// run, one named savepoint per batch, and committing once at the end.
pub async fn ingest<I: BatchIngestor>(
    ingestor: &I,
    uow: &mut UnitOfWork,
    program_id: recon_core::Id,
    records: Vec<I::Record>,
) -> Result<IngestResult, StoreError> {
    let total = records.len();
    let mut result = IngestResult {
        total,
        ..Default::default()
    };

    for (batch_index, batch) in records.chunks(ingestor.batch_size()).enumerate() {
        let savepoint = format!("batch_{batch_index}");
        uow.create_savepoint(&savepoint).await?;

        match ingestor.process_batch(uow, program_id, batch).await {
            Ok(outcome) => {
                uow.release_savepoint(&savepoint).await?;
                result.ok_batches += 1;
                result.created_hosts += outcome.created_hosts;
                result.created_services += outcome.created_services;
                result.created_endpoints += outcome.created_endpoints;
            }
            Err(err) => {
                uow.rollback_to_savepoint(&savepoint).await?;
                result.failed_batches += 1;
                tracing::error!(
                    batch_index,
                    batch_size = batch.len(),
                    error = %err,
                    "ingestion batch failed, rolled back to savepoint"
                );
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_batch_size_matches_spec() {
        assert_eq!(DEFAULT_BATCH_SIZE, 50);
    }

    #[test]
    fn ingest_result_starts_empty() {
        let result = IngestResult::default();
        assert_eq!(result.total, 0);
        assert_eq!(result.ok_batches, 0);
        assert_eq!(result.failed_batches, 0);
    }
}
