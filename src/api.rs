//! Minimal REST surface: program/scope-rule administration and a health
//! check. Grounded on `api::agentic_routes::create_agentic_router` — state
//! extraction via `State`, one handler per route, a trailing health check.
//! Scanning itself is event-driven (C7/C8); this surface only seeds and
//! inspects programs.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use recon_store::repositories::{ProgramRepository, ScopeRuleRepository};
use recon_store::UnitOfWork;

#[derive(Debug, Deserialize)]
pub struct CreateProgramRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ProgramResponse {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateScopeRuleRequest {
    pub kind: String,
    pub pattern: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct ScopeRuleResponse {
    pub id: String,
    pub kind: String,
    pub pattern: String,
    pub action: String,
}

async fn create_program(
    State(pool): State<PgPool>,
    Json(req): Json<CreateProgramRequest>,
) -> Result<Json<ProgramResponse>, StatusCode> {
    let mut uow = UnitOfWork::begin(&pool).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let program = ProgramRepository::get_or_create(&mut uow, &req.name)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    uow.commit().await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(ProgramResponse { id: program.id.to_string(), name: program.name }))
}

async fn list_programs(State(pool): State<PgPool>) -> Result<Json<Vec<ProgramResponse>>, StatusCode> {
    let mut uow = UnitOfWork::begin(&pool).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let programs = ProgramRepository::find_many(&mut uow, 100, 0)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(
        programs
            .into_iter()
            .map(|p| ProgramResponse { id: p.id.to_string(), name: p.name })
            .collect(),
    ))
}

async fn create_scope_rule(
    State(pool): State<PgPool>,
    Path(program_id): Path<uuid::Uuid>,
    Json(req): Json<CreateScopeRuleRequest>,
) -> Result<Json<ScopeRuleResponse>, StatusCode> {
    let mut uow = UnitOfWork::begin(&pool).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let rule = ScopeRuleRepository::create(&mut uow, program_id, &req.kind, &req.pattern, &req.action)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    uow.commit().await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(ScopeRuleResponse {
        id: rule.id.to_string(),
        kind: rule.kind,
        pattern: rule.pattern,
        action: rule.action,
    }))
}

async fn list_scope_rules(
    State(pool): State<PgPool>,
    Path(program_id): Path<uuid::Uuid>,
) -> Result<Json<Vec<ScopeRuleResponse>>, StatusCode> {
    let mut uow = UnitOfWork::begin(&pool).await.map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let rules = ScopeRuleRepository::find_by_program(&mut uow, program_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(
        rules
            .into_iter()
            .map(|r| ScopeRuleResponse { id: r.id.to_string(), kind: r.kind, pattern: r.pattern, action: r.action })
            .collect(),
    ))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "recon-orchestrator"}))
}

pub fn create_router(pool: PgPool) -> Router {
    Router::new()
        .route("/api/programs", post(create_program).get(list_programs))
        .route("/api/programs/:program_id/scope-rules", post(create_scope_rule).get(list_scope_rules))
        .route("/api/health", get(health_check))
        .with_state(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_program_request_deserializes() {
        let req: CreateProgramRequest = serde_json::from_str(r#"{"name":"acme-bug-bounty"}"#).unwrap();
        assert_eq!(req.name, "acme-bug-bounty");
    }

    #[test]
    fn create_scope_rule_request_deserializes() {
        let req: CreateScopeRuleRequest =
            serde_json::from_str(r#"{"kind":"wildcard","pattern":"*.example.com","action":"include"}"#).unwrap();
        assert_eq!(req.kind, "wildcard");
        assert_eq!(req.action, "include");
    }
}
