// src/handlers/rbac.rs

use axum::{extract::State, response::IntoResponse};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath},
        response::{created, ok},
    },
    config::AppState,
    models::rbac::{ApprovalRole, NewApprovalRole, UpdateApprovalRole},
};

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Cargos",
    responses((status = 200, description = "Cargos de aprovação", body = [ApprovalRole]))
)]
pub async fn list_roles(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let roles = app_state.rbac_service.list_roles().await?;
    Ok(ok("OK", roles))
}

// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "Cargos",
    request_body = NewApprovalRole,
    responses(
        (status = 201, description = "Cargo criado", body = ApprovalRole),
        (status = 409, description = "Usuário já possui cargo")
    )
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<NewApprovalRole>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = app_state
        .rbac_service
        .create_role(&app_state.db_pool, &payload)
        .await?;

    Ok(created("Cargo criado", role))
}

// PUT /api/roles/{id}
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    tag = "Cargos",
    request_body = UpdateApprovalRole,
    params(("id" = Uuid, Path, description = "ID do cargo")),
    responses(
        (status = 200, description = "Cargo atualizado", body = ApprovalRole),
        (status = 404, description = "Cargo não encontrado")
    )
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    AppPath(role_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateApprovalRole>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = app_state
        .rbac_service
        .update_role(&app_state.db_pool, role_id, &payload)
        .await?;

    Ok(ok("Cargo atualizado", role))
}
