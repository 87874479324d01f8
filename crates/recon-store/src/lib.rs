//! Asset repository and unit of work (C5): Postgres-backed persistence for
//! the recon orchestrator's asset graph.

pub mod entities;
pub mod error;
pub mod repositories;
pub mod repository;
pub mod uow;

pub use error::StoreError;
pub use repositories::*;
pub use repository::{OrderBy, Repository};
pub use uow::UnitOfWork;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect to Postgres with the pool sizing the teacher's services use.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))
}
