//! Error taxonomy for the asset repository and unit of work.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("entity not found")]
    NotFound,

    #[error("unknown savepoint: {0}")]
    UnknownSavepoint(String),
}
