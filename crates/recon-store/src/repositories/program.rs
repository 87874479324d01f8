//! Program repository: the root of ownership, cascading delete.

use async_trait::async_trait;
use recon_core::Id;
use uuid::Uuid;

use crate::entities::Program;
use crate::error::StoreError;
use crate::repository::{OrderBy, Repository};
use crate::uow::UnitOfWork;

pub struct ProgramRepository;

/// `name` is the only filterable field; `None` means "no filter".
#[derive(Debug, Clone, Default)]
pub struct ProgramFilter {
    pub name: Option<String>,
}

pub struct ProgramPatch {
    pub name: String,
}

impl ProgramRepository {
    pub async fn get(uow: &mut UnitOfWork, id: Id) -> Result<Option<Program>, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Program>("SELECT id, name, created_at FROM programs WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **exec)
            .await?;
        Ok(row)
    }

    pub async fn get_by_name(uow: &mut UnitOfWork, name: &str) -> Result<Option<Program>, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Program>("SELECT id, name, created_at FROM programs WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut **exec)
            .await?;
        Ok(row)
    }

    pub async fn create(uow: &mut UnitOfWork, name: &str) -> Result<Program, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Program>(
            "INSERT INTO programs (id, name, created_at) VALUES ($1, $2, now()) RETURNING id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    pub async fn get_or_create(uow: &mut UnitOfWork, name: &str) -> Result<Program, StoreError> {
        if let Some(existing) = Self::get_by_name(uow, name).await? {
            return Ok(existing);
        }
        Self::create(uow, name).await
    }

    pub async fn delete(uow: &mut UnitOfWork, id: Id) -> Result<(), StoreError> {
        let exec = uow.executor();
        sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&mut **exec)
            .await?;
        Ok(())
    }

    pub async fn find_many(
        uow: &mut UnitOfWork,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Program>, StoreError> {
        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Program>(
            "SELECT id, name, created_at FROM programs ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Repository for ProgramRepository {
    type Row = Program;
    type Filter = ProgramFilter;
    type Patch = ProgramPatch;
    type Create = String;

    async fn get(uow: &mut UnitOfWork, id: Id) -> Result<Option<Program>, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Program>("SELECT id, name, created_at FROM programs WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **exec)
            .await?;
        Ok(row)
    }

    async fn find_many(
        uow: &mut UnitOfWork,
        filter: &ProgramFilter,
        limit: i64,
        offset: i64,
        order_by: Option<OrderBy>,
    ) -> Result<Vec<Program>, StoreError> {
        let (column, descending) = order_by.map(|o| (o.column, o.descending)).unwrap_or(("created_at", true));
        let direction = if descending { "DESC" } else { "ASC" };
        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Program>(&format!(
            "SELECT id, name, created_at FROM programs WHERE ($1::text IS NULL OR name = $1)
             ORDER BY {column} {direction} LIMIT $2 OFFSET $3"
        ))
        .bind(&filter.name)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }

    async fn count(uow: &mut UnitOfWork, filter: &ProgramFilter) -> Result<i64, StoreError> {
        let exec = uow.executor();
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM programs WHERE ($1::text IS NULL OR name = $1)")
            .bind(&filter.name)
            .fetch_one(&mut **exec)
            .await?;
        Ok(count)
    }

    async fn create(uow: &mut UnitOfWork, name: String) -> Result<Program, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Program>(
            "INSERT INTO programs (id, name, created_at) VALUES ($1, $2, now()) RETURNING id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    async fn update(uow: &mut UnitOfWork, id: Id, patch: ProgramPatch) -> Result<Program, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, Program>(
            "UPDATE programs SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(id)
        .bind(&patch.name)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    async fn delete(uow: &mut UnitOfWork, id: Id) -> Result<(), StoreError> {
        let exec = uow.executor();
        sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&mut **exec)
            .await?;
        Ok(())
    }

    /// Plain multi-row insert via `UNNEST`; fails if any name already exists
    /// (the unique constraint on `name`), by design — use `bulk_upsert` when
    /// duplicates are expected.
    async fn bulk_create(uow: &mut UnitOfWork, items: Vec<String>) -> Result<Vec<Program>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = items.iter().map(|_| Uuid::new_v4()).collect();
        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Program>(
            r#"
            INSERT INTO programs (id, name, created_at)
            SELECT id, name, now() FROM UNNEST($1::uuid[], $2::text[]) AS t(id, name)
            RETURNING id, name, created_at
            "#,
        )
        .bind(&ids)
        .bind(&items)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }

    /// Upsert on the `name` unique constraint: existing programs are
    /// returned as-is (there is nothing else on a program to update).
    async fn bulk_upsert(uow: &mut UnitOfWork, items: Vec<String>) -> Result<Vec<Program>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = items.iter().map(|_| Uuid::new_v4()).collect();
        let exec = uow.executor();
        let rows = sqlx::query_as::<_, Program>(
            r#"
            INSERT INTO programs (id, name, created_at)
            SELECT id, name, now() FROM UNNEST($1::uuid[], $2::text[]) AS t(id, name)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, created_at
            "#,
        )
        .bind(&ids)
        .bind(&items)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }
}
