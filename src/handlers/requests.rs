// src/handlers/requests.rs

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath},
        response::{created, ok},
    },
    config::AppState,
    models::requests::{ApprovalLine, NewSupplyRequest, SupplyRequest},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequestPayload {
    #[validate(length(min = 1, max = 100, message = "Informe quem está aprovando."))]
    #[schema(example = "alice")]
    pub approved_by: String,

    #[serde(default)]
    pub items: Vec<ApprovalLine>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequestPayload {
    #[validate(length(min = 1, max = 100, message = "Informe quem está rejeitando."))]
    pub rejected_by: String,

    #[validate(length(min = 1, message = "O motivo da rejeição é obrigatório."))]
    pub reason: String,
}

// GET /api/atk/requests
#[utoipa::path(
    get,
    path = "/api/atk/requests",
    tag = "Pedidos",
    responses((status = 200, description = "Pedidos com suas linhas, mais recentes primeiro", body = [SupplyRequest]))
)]
pub async fn list_requests(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let requests = app_state.request_service.list_requests().await?;
    Ok(ok("OK", requests))
}

// POST /api/atk/requests
#[utoipa::path(
    post,
    path = "/api/atk/requests",
    tag = "Pedidos",
    request_body = NewSupplyRequest,
    responses(
        (status = 201, description = "Pedido criado como Pending", body = SupplyRequest),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Item de ATK não encontrado")
    )
)]
pub async fn create_request(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<NewSupplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let request = app_state
        .request_service
        .create_request(&app_state.db_pool, &payload)
        .await?;

    Ok(created("Pedido criado", request))
}

// GET /api/atk/requests/{id}
#[utoipa::path(
    get,
    path = "/api/atk/requests/{id}",
    tag = "Pedidos",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido com linhas", body = SupplyRequest),
        (status = 404, description = "Pedido não encontrado")
    )
)]
pub async fn get_request(
    State(app_state): State<AppState>,
    AppPath(request_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .request_service
        .get_request(&app_state.db_pool, request_id)
        .await?;
    Ok(ok("OK", request))
}

// DELETE /api/atk/requests/{id}
#[utoipa::path(
    delete,
    path = "/api/atk/requests/{id}",
    tag = "Pedidos",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido removido"),
        (status = 404, description = "Pedido não encontrado")
    )
)]
pub async fn delete_request(
    State(app_state): State<AppState>,
    AppPath(request_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .request_service
        .delete_request(&app_state.db_pool, request_id)
        .await?;
    Ok(ok("Pedido removido", request_id))
}

// POST /api/atk/requests/{id}/approve
#[utoipa::path(
    post,
    path = "/api/atk/requests/{id}/approve",
    tag = "Pedidos",
    request_body = ApproveRequestPayload,
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido aprovado e estoque baixado", body = SupplyRequest),
        (status = 403, description = "Aprovador sem cargo ou acima do limite"),
        (status = 404, description = "Pedido ou linha não encontrados"),
        (status = 409, description = "Pedido já processado ou estoque insuficiente"),
        (status = 422, description = "Quantidade aprovada acima da solicitada")
    )
)]
pub async fn approve_request(
    State(app_state): State<AppState>,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(payload): AppJson<ApproveRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let request = app_state
        .request_service
        .approve_request(&app_state.db_pool, request_id, &payload.approved_by, &payload.items)
        .await?;

    Ok(ok("Pedido aprovado", request))
}

// POST /api/atk/requests/{id}/reject
#[utoipa::path(
    post,
    path = "/api/atk/requests/{id}/reject",
    tag = "Pedidos",
    request_body = RejectRequestPayload,
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido rejeitado", body = SupplyRequest),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Pedido já processado")
    )
)]
pub async fn reject_request(
    State(app_state): State<AppState>,
    AppPath(request_id): AppPath<Uuid>,
    AppJson(payload): AppJson<RejectRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let request = app_state
        .request_service
        .reject_request(&app_state.db_pool, request_id, &payload.rejected_by, &payload.reason)
        .await?;

    Ok(ok("Pedido rejeitado", request))
}
