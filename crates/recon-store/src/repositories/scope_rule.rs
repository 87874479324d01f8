//! Scope rule repository: read access to a program's immutable-for-the-run
//! rule set, plus creation for setup/admin flows.

use recon_core::Id;
use uuid::Uuid;

use crate::entities::ScopeRuleRow;
use crate::error::StoreError;
use crate::uow::UnitOfWork;

pub struct ScopeRuleRepository;

impl ScopeRuleRepository {
    pub async fn create(
        uow: &mut UnitOfWork,
        program_id: Id,
        kind: &str,
        pattern: &str,
        action: &str,
    ) -> Result<ScopeRuleRow, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, ScopeRuleRow>(
            "INSERT INTO scope_rules (id, program_id, kind, pattern, action, created_at)
             VALUES ($1, $2, $3, $4, $5, now())
             RETURNING id, program_id, kind, pattern, action, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(program_id)
        .bind(kind)
        .bind(pattern)
        .bind(action)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    /// All rules for `program_id`. A scan run should fetch this once and
    /// treat it as an immutable snapshot for the run's duration.
    pub async fn find_by_program(
        uow: &mut UnitOfWork,
        program_id: Id,
    ) -> Result<Vec<ScopeRuleRow>, StoreError> {
        let exec = uow.executor();
        let rows = sqlx::query_as::<_, ScopeRuleRow>(
            "SELECT id, program_id, kind, pattern, action, created_at
             FROM scope_rules WHERE program_id = $1 ORDER BY created_at",
        )
        .bind(program_id)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }

    pub async fn delete(uow: &mut UnitOfWork, id: Id) -> Result<(), StoreError> {
        let exec = uow.executor();
        sqlx::query("DELETE FROM scope_rules WHERE id = $1")
            .bind(id)
            .execute(&mut **exec)
            .await?;
        Ok(())
    }
}
