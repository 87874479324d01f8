//! Endpoint repository: unique per `(service_id, normalized_path, method)`;
//! `methods` is the union of every method observed for that pair.

use async_trait::async_trait;
use uuid::Uuid;

use recon_core::Id;
use recon_dedup::normalize_path;

use crate::entities::Endpoint;
use crate::error::StoreError;
use crate::repository::{OrderBy, Repository};
use crate::uow::UnitOfWork;

pub struct EndpointRepository;

#[derive(Debug, Clone)]
pub struct EndpointFilter {
    pub service_id: Id,
    pub normalized_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EndpointPatch {
    pub status_code: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewEndpoint {
    pub host_id: Id,
    pub service_id: Id,
    pub path: String,
    pub method: String,
    pub normalized_path: Option<String>,
    pub status_code: Option<i32>,
}

impl EndpointRepository {
    pub async fn find_by_normalized_path(
        uow: &mut UnitOfWork,
        service_id: Id,
        normalized_path: &str,
        method: &str,
    ) -> Result<Option<Endpoint>, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Endpoint>(
            "SELECT id, host_id, service_id, path, normalized_path, method, methods, status_code, created_at, updated_at
             FROM endpoints WHERE service_id = $1 AND normalized_path = $2 AND method = $3",
        )
        .bind(service_id)
        .bind(normalized_path)
        .bind(method)
        .fetch_optional(&mut **exec)
        .await?;
        Ok(row)
    }

    /// Compute `normalized_path` if absent, then upsert on
    /// `(service_id, normalized_path, method)`; on conflict updates `path`
    /// and `status_code` and folds `method` into the `methods` union.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_with_method(
        uow: &mut UnitOfWork,
        host_id: Id,
        service_id: Id,
        path: &str,
        method: &str,
        normalized_path: Option<&str>,
        status_code: Option<i32>,
    ) -> Result<Endpoint, StoreError> {
        let normalized = normalized_path.map(str::to_string).unwrap_or_else(|| normalize_path(path));
        let method = method.to_uppercase();

        let exec = uow.executor();
        let row = sqlx::query_as::<_, Endpoint>(
            r#"
            INSERT INTO endpoints
                (id, host_id, service_id, path, normalized_path, method, methods, status_code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, ARRAY[$6]::text[], $7, now(), now())
            ON CONFLICT (service_id, normalized_path, method) DO UPDATE
                SET path = EXCLUDED.path,
                    status_code = COALESCE(EXCLUDED.status_code, endpoints.status_code),
                    methods = (
                        SELECT array_agg(DISTINCT m) FROM unnest(endpoints.methods || EXCLUDED.methods) AS m
                    ),
                    updated_at = now()
            RETURNING id, host_id, service_id, path, normalized_path, method, methods, status_code, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(host_id)
        .bind(service_id)
        .bind(path)
        .bind(&normalized)
        .bind(&method)
        .bind(status_code)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl Repository for EndpointRepository {
    type Row = Endpoint;
    type Filter = EndpointFilter;
    type Patch = EndpointPatch;
    type Create = NewEndpoint;

    async fn get(uow: &mut UnitOfWork, id: Id) -> Result<Option<Endpoint>, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Endpoint>(
            "SELECT id, host_id, service_id, path, normalized_path, method, methods, status_code, created_at, updated_at
             FROM endpoints WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut **exec)
        .await?;
        Ok(row)
    }

    async fn find_many(
        uow: &mut UnitOfWork,
        filter: &EndpointFilter,
        limit: i64,
        offset: i64,
        order_by: Option<OrderBy>,
    ) -> Result<Vec<Endpoint>, StoreError> {
        let (column, descending) = order_by.map(|o| (o.column, o.descending)).unwrap_or(("normalized_path", false));
        let direction = if descending { "DESC" } else { "ASC" };
        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Endpoint>(&format!(
            "SELECT id, host_id, service_id, path, normalized_path, method, methods, status_code, created_at, updated_at
             FROM endpoints WHERE service_id = $1 AND ($2::text IS NULL OR normalized_path = $2)
             ORDER BY {column} {direction} LIMIT $3 OFFSET $4"
        ))
        .bind(filter.service_id)
        .bind(&filter.normalized_path)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }

    async fn count(uow: &mut UnitOfWork, filter: &EndpointFilter) -> Result<i64, StoreError> {
        let exec = uow.executor();
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM endpoints WHERE service_id = $1 AND ($2::text IS NULL OR normalized_path = $2)",
        )
        .bind(filter.service_id)
        .bind(&filter.normalized_path)
        .fetch_one(&mut **exec)
        .await?;
        Ok(count)
    }

    async fn create(uow: &mut UnitOfWork, data: NewEndpoint) -> Result<Endpoint, StoreError> {
        Self::upsert_with_method(
            uow,
            data.host_id,
            data.service_id,
            &data.path,
            &data.method,
            data.normalized_path.as_deref(),
            data.status_code,
        )
        .await
    }

    async fn update(uow: &mut UnitOfWork, id: Id, patch: EndpointPatch) -> Result<Endpoint, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Endpoint>(
            r#"
            UPDATE endpoints SET status_code = COALESCE($2, status_code), updated_at = now()
            WHERE id = $1
            RETURNING id, host_id, service_id, path, normalized_path, method, methods, status_code, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.status_code)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    async fn delete(uow: &mut UnitOfWork, id: Id) -> Result<(), StoreError> {
        let exec = uow.executor();
        sqlx::query("DELETE FROM endpoints WHERE id = $1")
            .bind(id)
            .execute(&mut **exec)
            .await?;
        Ok(())
    }

    /// Plain multi-row insert via `UNNEST`; relies on the
    /// `(service_id, normalized_path, method)` unique constraint rejecting
    /// duplicates.
    async fn bulk_create(uow: &mut UnitOfWork, items: Vec<NewEndpoint>) -> Result<Vec<Endpoint>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let prepared: Vec<(Uuid, Uuid, Uuid, String, String, String, Option<i32>)> = items
            .into_iter()
            .map(|item| {
                let normalized = item.normalized_path.unwrap_or_else(|| normalize_path(&item.path));
                let method = item.method.to_uppercase();
                (Uuid::new_v4(), item.host_id, item.service_id, item.path, normalized, method, item.status_code)
            })
            .collect();

        let ids: Vec<Uuid> = prepared.iter().map(|p| p.0).collect();
        let host_ids: Vec<Uuid> = prepared.iter().map(|p| p.1).collect();
        let service_ids: Vec<Uuid> = prepared.iter().map(|p| p.2).collect();
        let paths: Vec<String> = prepared.iter().map(|p| p.3.clone()).collect();
        let normalized_paths: Vec<String> = prepared.iter().map(|p| p.4.clone()).collect();
        let methods: Vec<String> = prepared.iter().map(|p| p.5.clone()).collect();
        let status_codes: Vec<Option<i32>> = prepared.iter().map(|p| p.6).collect();

        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Endpoint>(
            r#"
            INSERT INTO endpoints
                (id, host_id, service_id, path, normalized_path, method, methods, status_code, created_at, updated_at)
            SELECT id, host_id, service_id, path, normalized_path, method, ARRAY[method]::text[], status_code, now(), now()
            FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::text[], $5::text[], $6::text[], $7::int[])
                AS t(id, host_id, service_id, path, normalized_path, method, status_code)
            RETURNING id, host_id, service_id, path, normalized_path, method, methods, status_code, created_at, updated_at
            "#,
        )
        .bind(&ids)
        .bind(&host_ids)
        .bind(&service_ids)
        .bind(&paths)
        .bind(&normalized_paths)
        .bind(&methods)
        .bind(&status_codes)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }

    /// Upsert on `(service_id, normalized_path, method)` in one round trip;
    /// each conflicting row folds `method` into its `methods` union the same
    /// way `upsert_with_method` does for a single row.
    async fn bulk_upsert(uow: &mut UnitOfWork, items: Vec<NewEndpoint>) -> Result<Vec<Endpoint>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let prepared: Vec<(Uuid, Uuid, Uuid, String, String, String, Option<i32>)> = items
            .into_iter()
            .map(|item| {
                let normalized = item.normalized_path.unwrap_or_else(|| normalize_path(&item.path));
                let method = item.method.to_uppercase();
                (Uuid::new_v4(), item.host_id, item.service_id, item.path, normalized, method, item.status_code)
            })
            .collect();

        let ids: Vec<Uuid> = prepared.iter().map(|p| p.0).collect();
        let host_ids: Vec<Uuid> = prepared.iter().map(|p| p.1).collect();
        let service_ids: Vec<Uuid> = prepared.iter().map(|p| p.2).collect();
        let paths: Vec<String> = prepared.iter().map(|p| p.3.clone()).collect();
        let normalized_paths: Vec<String> = prepared.iter().map(|p| p.4.clone()).collect();
        let methods: Vec<String> = prepared.iter().map(|p| p.5.clone()).collect();
        let status_codes: Vec<Option<i32>> = prepared.iter().map(|p| p.6).collect();

        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Endpoint>(
            r#"
            INSERT INTO endpoints
                (id, host_id, service_id, path, normalized_path, method, methods, status_code, created_at, updated_at)
            SELECT id, host_id, service_id, path, normalized_path, method, ARRAY[method]::text[], status_code, now(), now()
            FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::text[], $5::text[], $6::text[], $7::int[])
                AS t(id, host_id, service_id, path, normalized_path, method, status_code)
            ON CONFLICT (service_id, normalized_path, method) DO UPDATE
                SET path = EXCLUDED.path,
                    status_code = COALESCE(EXCLUDED.status_code, endpoints.status_code),
                    methods = (
                        SELECT array_agg(DISTINCT m) FROM unnest(endpoints.methods || EXCLUDED.methods) AS m
                    ),
                    updated_at = now()
            RETURNING id, host_id, service_id, path, normalized_path, method, methods, status_code, created_at, updated_at
            "#,
        )
        .bind(&ids)
        .bind(&host_ids)
        .bind(&service_ids)
        .bind(&paths)
        .bind(&normalized_paths)
        .bind(&methods)
        .bind(&status_codes)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }
}
