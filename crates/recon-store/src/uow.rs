//! Unit of Work: a scoped transaction with named savepoints.
//!
//! `sqlx` has no native savepoint API, so named savepoints are issued as raw
//! `SAVEPOINT` / `RELEASE SAVEPOINT` / `ROLLBACK TO SAVEPOINT` statements
//! against the held transaction. Savepoint names are validated before being
//! interpolated, since identifiers can't be bound as parameters.

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::StoreError;

/// A scoped acquisition of a database transaction. Dropping it without
/// calling [`UnitOfWork::commit`] rolls back, since `sqlx::Transaction`
/// rolls back on drop.
pub struct UnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl UnitOfWork {
    pub async fn begin(pool: &PgPool) -> Result<Self, StoreError> {
        let tx = pool.begin().await?;
        Ok(Self { tx: Some(tx) })
    }

    /// Borrow the underlying transaction/executor for repository calls.
    pub fn executor(&mut self) -> &mut Transaction<'static, Postgres> {
        self.tx.as_mut().expect("unit of work already finished")
    }

    pub async fn commit(mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().expect("unit of work already finished");
        tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().expect("unit of work already finished");
        tx.rollback().await?;
        Ok(())
    }

    pub async fn create_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        let name = validate_savepoint_name(name)?;
        let sql = format!("SAVEPOINT {name}");
        sqlx::query(&sql).execute(self.executor().as_mut()).await?;
        Ok(())
    }

    pub async fn release_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        let name = validate_savepoint_name(name)?;
        let sql = format!("RELEASE SAVEPOINT {name}");
        sqlx::query(&sql).execute(self.executor().as_mut()).await?;
        Ok(())
    }

    pub async fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), StoreError> {
        let name = validate_savepoint_name(name)?;
        let sql = format!("ROLLBACK TO SAVEPOINT {name}");
        sqlx::query(&sql).execute(self.executor().as_mut()).await?;
        Ok(())
    }
}

/// A savepoint name must be a plain identifier: this is not user input in
/// practice (batch indices), but we never interpolate unchecked strings
/// into SQL.
fn validate_savepoint_name(name: &str) -> Result<&str, StoreError> {
    let valid = !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::UnknownSavepoint(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_identifier_shaped_names() {
        assert!(validate_savepoint_name("batch_3").is_ok());
        assert!(validate_savepoint_name("3batch").is_err());
        assert!(validate_savepoint_name("batch; DROP TABLE hosts").is_err());
        assert!(validate_savepoint_name("").is_err());
    }
}
