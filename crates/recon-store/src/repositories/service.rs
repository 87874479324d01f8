//! Service repository: technologies is a monotonically-merged JSON map,
//! unique per `(ip_id, port)`. The merge happens in SQL (`services.technologies
//! || EXCLUDED.technologies`) so a whole batch can be upserted in one round
//! trip instead of reading each row back before deciding what changed.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use recon_core::Id;

use crate::entities::Service;
use crate::error::StoreError;
use crate::repository::{OrderBy, Repository};
use crate::uow::UnitOfWork;

pub struct ServiceRepository;

impl ServiceRepository {
    /// Which `(ip_id, port)` pairs already have a service row. One round
    /// trip, used to count newly-created services around a `bulk_upsert`
    /// call instead of checking existence per row.
    pub async fn existing_ports(
        uow: &mut UnitOfWork,
        pairs: &[(Id, i32)],
    ) -> Result<HashSet<(Id, i32)>, StoreError> {
        if pairs.is_empty() {
            return Ok(HashSet::new());
        }
        let ip_ids: Vec<Uuid> = pairs.iter().map(|(ip, _)| *ip).collect();
        let ports: Vec<i32> = pairs.iter().map(|(_, p)| *p).collect();

        let exec = uow.executor();
        let rows: Vec<(Uuid, i32)> = sqlx::query_as(
            r#"
            SELECT s.ip_id, s.port
            FROM services s
            JOIN UNNEST($1::uuid[], $2::int[]) AS t(ip_id, port)
                ON s.ip_id = t.ip_id AND s.port = t.port
            "#,
        )
        .bind(&ip_ids)
        .bind(&ports)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows.into_iter().collect())
    }
}

#[derive(Debug, Clone)]
pub struct ServiceFilter {
    pub ip_id: Id,
    pub port: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ServicePatch {
    pub technologies: Option<Value>,
    pub favicon_hash: Option<String>,
    pub websocket: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub ip_id: Id,
    pub scheme: String,
    pub port: i32,
    pub technologies: Map<String, Value>,
}

#[async_trait]
impl Repository for ServiceRepository {
    type Row = Service;
    type Filter = ServiceFilter;
    type Patch = ServicePatch;
    type Create = NewService;

    async fn get(uow: &mut UnitOfWork, id: Id) -> Result<Option<Service>, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Service>(
            "SELECT id, ip_id, scheme, port, technologies, favicon_hash, websocket, created_at, updated_at
             FROM services WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut **exec)
        .await?;
        Ok(row)
    }

    async fn find_many(
        uow: &mut UnitOfWork,
        filter: &ServiceFilter,
        limit: i64,
        offset: i64,
        order_by: Option<OrderBy>,
    ) -> Result<Vec<Service>, StoreError> {
        let (column, descending) = order_by.map(|o| (o.column, o.descending)).unwrap_or(("port", false));
        let direction = if descending { "DESC" } else { "ASC" };
        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Service>(&format!(
            "SELECT id, ip_id, scheme, port, technologies, favicon_hash, websocket, created_at, updated_at
             FROM services WHERE ip_id = $1 AND ($2::int IS NULL OR port = $2)
             ORDER BY {column} {direction} LIMIT $3 OFFSET $4"
        ))
        .bind(filter.ip_id)
        .bind(filter.port)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }

    async fn count(uow: &mut UnitOfWork, filter: &ServiceFilter) -> Result<i64, StoreError> {
        let exec = uow.executor();
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM services WHERE ip_id = $1 AND ($2::int IS NULL OR port = $2)",
        )
        .bind(filter.ip_id)
        .bind(filter.port)
        .fetch_one(&mut **exec)
        .await?;
        Ok(count)
    }

    async fn create(uow: &mut UnitOfWork, data: NewService) -> Result<Service, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (id, ip_id, scheme, port, technologies, websocket, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, false, now(), now())
            RETURNING id, ip_id, scheme, port, technologies, favicon_hash, websocket, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.ip_id)
        .bind(&data.scheme)
        .bind(data.port)
        .bind(Value::Object(data.technologies))
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    async fn update(uow: &mut UnitOfWork, id: Id, patch: ServicePatch) -> Result<Service, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Service>(
            r#"
            UPDATE services SET
                technologies = COALESCE($2, technologies),
                favicon_hash = COALESCE($3, favicon_hash),
                websocket = COALESCE($4, websocket),
                updated_at = now()
            WHERE id = $1
            RETURNING id, ip_id, scheme, port, technologies, favicon_hash, websocket, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.technologies)
        .bind(patch.favicon_hash)
        .bind(patch.websocket)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    async fn delete(uow: &mut UnitOfWork, id: Id) -> Result<(), StoreError> {
        let exec = uow.executor();
        sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&mut **exec)
            .await?;
        Ok(())
    }

    /// Plain multi-row insert via `UNNEST`; relies on the `(ip_id, port)`
    /// unique constraint rejecting duplicates.
    async fn bulk_create(uow: &mut UnitOfWork, items: Vec<NewService>) -> Result<Vec<Service>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = items.iter().map(|_| Uuid::new_v4()).collect();
        let ip_ids: Vec<Uuid> = items.iter().map(|i| i.ip_id).collect();
        let schemes: Vec<String> = items.iter().map(|i| i.scheme.clone()).collect();
        let ports: Vec<i32> = items.iter().map(|i| i.port).collect();
        let tech: Vec<Value> = items.iter().map(|i| Value::Object(i.technologies.clone())).collect();

        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (id, ip_id, scheme, port, technologies, websocket, created_at, updated_at)
            SELECT id, ip_id, scheme, port, technologies, false, now(), now()
            FROM UNNEST($1::uuid[], $2::uuid[], $3::text[], $4::int[], $5::jsonb[])
                AS t(id, ip_id, scheme, port, technologies)
            RETURNING id, ip_id, scheme, port, technologies, favicon_hash, websocket, created_at, updated_at
            "#,
        )
        .bind(&ids)
        .bind(&ip_ids)
        .bind(&schemes)
        .bind(&ports)
        .bind(&tech)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }

    /// Upsert on `(ip_id, port)` in one round trip. On conflict, merges
    /// `technologies` with the `||` jsonb operator (new keys win, kept keys
    /// survive) entirely in SQL, so the batch ingestor never has to read a
    /// row back to decide what to merge.
    async fn bulk_upsert(uow: &mut UnitOfWork, items: Vec<NewService>) -> Result<Vec<Service>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = items.iter().map(|_| Uuid::new_v4()).collect();
        let ip_ids: Vec<Uuid> = items.iter().map(|i| i.ip_id).collect();
        let schemes: Vec<String> = items.iter().map(|i| i.scheme.clone()).collect();
        let ports: Vec<i32> = items.iter().map(|i| i.port).collect();
        let tech: Vec<Value> = items.iter().map(|i| Value::Object(i.technologies.clone())).collect();

        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (id, ip_id, scheme, port, technologies, websocket, created_at, updated_at)
            SELECT id, ip_id, scheme, port, technologies, false, now(), now()
            FROM UNNEST($1::uuid[], $2::uuid[], $3::text[], $4::int[], $5::jsonb[])
                AS t(id, ip_id, scheme, port, technologies)
            ON CONFLICT (ip_id, port) DO UPDATE
                SET technologies = services.technologies || EXCLUDED.technologies,
                    scheme = EXCLUDED.scheme,
                    updated_at = now()
            RETURNING id, ip_id, scheme, port, technologies, favicon_hash, websocket, created_at, updated_at
            "#,
        )
        .bind(&ids)
        .bind(&ip_ids)
        .bind(&schemes)
        .bind(&ports)
        .bind(&tech)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }
}
