// src/handlers/inventory.rs

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath, AppQuery},
        response::{created, ok},
    },
    config::AppState,
    models::inventory::{
        NewStockTransaction, NewSupplyCategory, NewSupplyItem, StockTransaction, SupplyCategory,
        SupplyItem, UpdateSupplyItem,
    },
};

// =============================================================================
//  CATEGORIAS
// =============================================================================

// GET /api/atk/categories
#[utoipa::path(
    get,
    path = "/api/atk/categories",
    tag = "ATK",
    responses((status = 200, description = "Categorias de ATK", body = [SupplyCategory]))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.inventory_service.list_categories().await?;
    Ok(ok("OK", categories))
}

// POST /api/atk/categories
#[utoipa::path(
    post,
    path = "/api/atk/categories",
    tag = "ATK",
    request_body = NewSupplyCategory,
    responses(
        (status = 201, description = "Categoria criada", body = SupplyCategory),
        (status = 409, description = "Código já existe")
    )
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<NewSupplyCategory>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state
        .inventory_service
        .create_category(&app_state.db_pool, &payload)
        .await?;

    Ok(created("Categoria criada", category))
}

// =============================================================================
//  ITENS
// =============================================================================

// GET /api/atk/items
#[utoipa::path(
    get,
    path = "/api/atk/items",
    tag = "ATK",
    responses((status = 200, description = "Itens de ATK", body = [SupplyItem]))
)]
pub async fn list_items(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let items = app_state.inventory_service.list_items().await?;
    Ok(ok("OK", items))
}

// GET /api/atk/items/low-stock
#[utoipa::path(
    get,
    path = "/api/atk/items/low-stock",
    tag = "ATK",
    responses((status = 200, description = "Itens ativos no estoque mínimo ou abaixo", body = [SupplyItem]))
)]
pub async fn list_low_stock(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let items = app_state.inventory_service.list_low_stock().await?;
    Ok(ok("OK", items))
}

// GET /api/atk/items/{id}
#[utoipa::path(
    get,
    path = "/api/atk/items/{id}",
    tag = "ATK",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item", body = SupplyItem),
        (status = 404, description = "Item não encontrado")
    )
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    AppPath(item_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state.inventory_service.get_item(&app_state.db_pool, item_id).await?;
    Ok(ok("OK", item))
}

// POST /api/atk/items
#[utoipa::path(
    post,
    path = "/api/atk/items",
    tag = "ATK",
    request_body = NewSupplyItem,
    responses(
        (status = 201, description = "Item criado (estoque inicial lançado como IN)", body = SupplyItem),
        (status = 409, description = "Código já existe")
    )
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<NewSupplyItem>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .inventory_service
        .create_item(&app_state.db_pool, &payload)
        .await?;

    Ok(created("Item criado", item))
}

// PUT /api/atk/items/{id}
#[utoipa::path(
    put,
    path = "/api/atk/items/{id}",
    tag = "ATK",
    request_body = UpdateSupplyItem,
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item atualizado (o estoque não muda por aqui)", body = SupplyItem),
        (status = 404, description = "Item não encontrado")
    )
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    AppPath(item_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateSupplyItem>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .inventory_service
        .update_item(&app_state.db_pool, item_id, &payload)
        .await?;

    Ok(ok("Item atualizado", item))
}

// DELETE /api/atk/items/{id}
#[utoipa::path(
    delete,
    path = "/api/atk/items/{id}",
    tag = "ATK",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item removido"),
        (status = 404, description = "Item não encontrado"),
        (status = 409, description = "Item com movimentações ou pedidos")
    )
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    AppPath(item_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.inventory_service.delete_item(&app_state.db_pool, item_id).await?;
    Ok(ok("Item removido", item_id))
}

// =============================================================================
//  LIVRO-RAZÃO
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransactionFilter {
    /// Filtra pelo item
    pub item_id: Option<Uuid>,
}

// GET /api/atk/transactions
#[utoipa::path(
    get,
    path = "/api/atk/transactions",
    tag = "ATK",
    params(TransactionFilter),
    responses((status = 200, description = "Movimentações, mais recentes primeiro", body = [StockTransaction]))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    AppQuery(filter): AppQuery<TransactionFilter>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = app_state.inventory_service.list_transactions(filter.item_id).await?;
    Ok(ok("OK", transactions))
}

// POST /api/atk/transactions
#[utoipa::path(
    post,
    path = "/api/atk/transactions",
    tag = "ATK",
    request_body = NewStockTransaction,
    responses(
        (status = 201, description = "Movimentação registrada com saldo anterior/novo", body = StockTransaction),
        (status = 404, description = "Item não encontrado"),
        (status = 409, description = "Saldo ficaria negativo (política reject)")
    )
)]
pub async fn create_transaction(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<NewStockTransaction>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let transaction = app_state
        .inventory_service
        .record_transaction(&app_state.db_pool, &payload)
        .await?;

    Ok(created("Movimentação registrada", transaction))
}
