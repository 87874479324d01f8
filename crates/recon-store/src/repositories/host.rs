//! Host repository: upsert on `(program_id, hostname)`, in_scope tracks the
//! program's current scope rules (see `recon-scope`).

use std::collections::HashSet;

use async_trait::async_trait;
use recon_core::Id;
use uuid::Uuid;

use crate::entities::Host;
use crate::error::StoreError;
use crate::repository::{OrderBy, Repository};
use crate::uow::UnitOfWork;

pub struct HostRepository;

/// `hostname` is an exact-match filter; `None` means "every host in the
/// program".
#[derive(Debug, Clone)]
pub struct HostFilter {
    pub program_id: Id,
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HostPatch {
    pub in_scope: Option<bool>,
    pub cname_chain: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct NewHost {
    pub program_id: Id,
    pub hostname: String,
    pub in_scope: bool,
    pub cname_chain: Vec<String>,
}

impl HostRepository {
    pub async fn get(uow: &mut UnitOfWork, id: Id) -> Result<Option<Host>, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Host>(
            "SELECT id, program_id, hostname, in_scope, cname_chain, created_at, updated_at
             FROM hosts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut **exec)
        .await?;
        Ok(row)
    }

    pub async fn get_by_hostname(
        uow: &mut UnitOfWork,
        program_id: Id,
        hostname: &str,
    ) -> Result<Option<Host>, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Host>(
            "SELECT id, program_id, hostname, in_scope, cname_chain, created_at, updated_at
             FROM hosts WHERE program_id = $1 AND hostname = $2",
        )
        .bind(program_id)
        .bind(hostname)
        .fetch_optional(&mut **exec)
        .await?;
        Ok(row)
    }

    /// Which of `hostnames` already exist for `program_id`. One round trip,
    /// used to count newly-created hosts around a `bulk_upsert` call instead
    /// of checking existence per row.
    pub async fn existing_hostnames(
        uow: &mut UnitOfWork,
        program_id: Id,
        hostnames: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        if hostnames.is_empty() {
            return Ok(HashSet::new());
        }
        let exec = uow.executor();
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT hostname FROM hosts WHERE program_id = $1 AND hostname = ANY($2::text[])",
        )
        .bind(program_id)
        .bind(hostnames)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows.into_iter().map(|(h,)| h).collect())
    }

    /// Upsert on `(program_id, hostname)`. `in_scope` is recomputed by the
    /// caller (the scope evaluator) before this is invoked, never here.
    pub async fn upsert(
        uow: &mut UnitOfWork,
        program_id: Id,
        hostname: &str,
        in_scope: bool,
        cname_chain: &[String],
    ) -> Result<Host, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Host>(
            r#"
            INSERT INTO hosts (id, program_id, hostname, in_scope, cname_chain, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, now(), now())
            ON CONFLICT (program_id, hostname) DO UPDATE
                SET in_scope = EXCLUDED.in_scope,
                    cname_chain = EXCLUDED.cname_chain,
                    updated_at = now()
            RETURNING id, program_id, hostname, in_scope, cname_chain, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(program_id)
        .bind(hostname)
        .bind(in_scope)
        .bind(cname_chain)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    pub async fn find_many(
        uow: &mut UnitOfWork,
        program_id: Id,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Host>, StoreError> {
        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Host>(
            "SELECT id, program_id, hostname, in_scope, cname_chain, created_at, updated_at
             FROM hosts WHERE program_id = $1 ORDER BY hostname LIMIT $2 OFFSET $3",
        )
        .bind(program_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }

    pub async fn count(uow: &mut UnitOfWork, program_id: Id) -> Result<i64, StoreError> {
        let exec = uow.executor();
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM hosts WHERE program_id = $1")
            .bind(program_id)
            .fetch_one(&mut **exec)
            .await?;
        Ok(count)
    }

    pub async fn delete(uow: &mut UnitOfWork, id: Id) -> Result<(), StoreError> {
        let exec = uow.executor();
        sqlx::query("DELETE FROM hosts WHERE id = $1")
            .bind(id)
            .execute(&mut **exec)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for HostRepository {
    type Row = Host;
    type Filter = HostFilter;
    type Patch = HostPatch;
    type Create = NewHost;

    async fn get(uow: &mut UnitOfWork, id: Id) -> Result<Option<Host>, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Host>(
            "SELECT id, program_id, hostname, in_scope, cname_chain, created_at, updated_at
             FROM hosts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut **exec)
        .await?;
        Ok(row)
    }

    async fn find_many(
        uow: &mut UnitOfWork,
        filter: &HostFilter,
        limit: i64,
        offset: i64,
        order_by: Option<OrderBy>,
    ) -> Result<Vec<Host>, StoreError> {
        let (column, descending) = order_by.map(|o| (o.column, o.descending)).unwrap_or(("hostname", false));
        let direction = if descending { "DESC" } else { "ASC" };
        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Host>(&format!(
            "SELECT id, program_id, hostname, in_scope, cname_chain, created_at, updated_at
             FROM hosts WHERE program_id = $1 AND ($2::text IS NULL OR hostname = $2)
             ORDER BY {column} {direction} LIMIT $3 OFFSET $4"
        ))
        .bind(filter.program_id)
        .bind(&filter.hostname)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }

    async fn count(uow: &mut UnitOfWork, filter: &HostFilter) -> Result<i64, StoreError> {
        let exec = uow.executor();
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM hosts WHERE program_id = $1 AND ($2::text IS NULL OR hostname = $2)",
        )
        .bind(filter.program_id)
        .bind(&filter.hostname)
        .fetch_one(&mut **exec)
        .await?;
        Ok(count)
    }

    async fn create(uow: &mut UnitOfWork, data: NewHost) -> Result<Host, StoreError> {
        Self::upsert(uow, data.program_id, &data.hostname, data.in_scope, &data.cname_chain).await
    }

    async fn update(uow: &mut UnitOfWork, id: Id, patch: HostPatch) -> Result<Host, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Host>(
            r#"
            UPDATE hosts SET
                in_scope = COALESCE($2, in_scope),
                cname_chain = COALESCE($3, cname_chain),
                updated_at = now()
            WHERE id = $1
            RETURNING id, program_id, hostname, in_scope, cname_chain, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.in_scope)
        .bind(patch.cname_chain)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    async fn delete(uow: &mut UnitOfWork, id: Id) -> Result<(), StoreError> {
        let exec = uow.executor();
        sqlx::query("DELETE FROM hosts WHERE id = $1")
            .bind(id)
            .execute(&mut **exec)
            .await?;
        Ok(())
    }

    /// Plain multi-row insert via `UNNEST`; relies on the `(program_id,
    /// hostname)` unique constraint rejecting duplicates.
    async fn bulk_create(uow: &mut UnitOfWork, items: Vec<NewHost>) -> Result<Vec<Host>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = items.iter().map(|_| Uuid::new_v4()).collect();
        let program_ids: Vec<Uuid> = items.iter().map(|i| i.program_id).collect();
        let hostnames: Vec<String> = items.iter().map(|i| i.hostname.clone()).collect();
        let in_scopes: Vec<bool> = items.iter().map(|i| i.in_scope).collect();

        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Host>(
            r#"
            INSERT INTO hosts (id, program_id, hostname, in_scope, cname_chain, created_at, updated_at)
            SELECT id, program_id, hostname, in_scope, '{}', now(), now()
            FROM UNNEST($1::uuid[], $2::uuid[], $3::text[], $4::bool[]) AS t(id, program_id, hostname, in_scope)
            RETURNING id, program_id, hostname, in_scope, cname_chain, created_at, updated_at
            "#,
        )
        .bind(&ids)
        .bind(&program_ids)
        .bind(&hostnames)
        .bind(&in_scopes)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }

    /// Upsert on `(program_id, hostname)` in one round trip: every row in
    /// `items` lands in a single `INSERT ... ON CONFLICT DO UPDATE`. This is
    /// the batch-ingestion counterpart to `upsert` above, used by
    /// `recon-pipeline`'s subfinder ingestor instead of one round trip per
    /// discovered hostname.
    async fn bulk_upsert(uow: &mut UnitOfWork, items: Vec<NewHost>) -> Result<Vec<Host>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = items.iter().map(|_| Uuid::new_v4()).collect();
        let program_ids: Vec<Uuid> = items.iter().map(|i| i.program_id).collect();
        let hostnames: Vec<String> = items.iter().map(|i| i.hostname.clone()).collect();
        let in_scopes: Vec<bool> = items.iter().map(|i| i.in_scope).collect();

        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Host>(
            r#"
            INSERT INTO hosts (id, program_id, hostname, in_scope, cname_chain, created_at, updated_at)
            SELECT id, program_id, hostname, in_scope, '{}', now(), now()
            FROM UNNEST($1::uuid[], $2::uuid[], $3::text[], $4::bool[]) AS t(id, program_id, hostname, in_scope)
            ON CONFLICT (program_id, hostname) DO UPDATE
                SET in_scope = EXCLUDED.in_scope,
                    updated_at = now()
            RETURNING id, program_id, hostname, in_scope, cname_chain, created_at, updated_at
            "#,
        )
        .bind(&ids)
        .bind(&program_ids)
        .bind(&hostnames)
        .bind(&in_scopes)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }
}
