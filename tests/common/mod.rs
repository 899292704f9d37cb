//! Helpers compartilhados pelos testes de integração.
//!
//! Cada teste recebe um banco novo do `#[sqlx::test]`, com as migrações aplicadas.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use atk_backend::config::{AppState, ApprovalPolicyKind, Config, NegativeStockPolicy};
use atk_backend::models::inventory::{NewSupplyItem, SupplyItem};
use atk_backend::models::requests::{NewRequestItem, NewSupplyRequest, SupplyRequest};
use atk_backend::routes;
use atk_backend::services::rbac_service::{AllowAll, ApprovalPolicy};

/// Config de teste: a pool vem do `#[sqlx::test]`, então a URL não é usada.
pub fn test_config(negative_stock_policy: NegativeStockPolicy) -> Config {
    Config {
        database_url: String::new(),
        server_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 5,
        db_acquire_timeout: Duration::from_secs(3),
        negative_stock_policy,
        approval_policy: ApprovalPolicyKind::None,
        cors_allowed_origins: vec!["http://localhost:5173".to_string()],
    }
}

/// Estado padrão: saldo negativo só gera aviso e qualquer aprovação passa.
pub fn test_state(pool: PgPool) -> AppState {
    test_state_with(pool, NegativeStockPolicy::Warn, Arc::new(AllowAll))
}

pub fn test_state_with(
    pool: PgPool,
    negative_stock_policy: NegativeStockPolicy,
    approval_policy: Arc<dyn ApprovalPolicy>,
) -> AppState {
    AppState::with_approval_policy(pool, test_config(negative_stock_policy), approval_policy)
}

/// Mesmo router do binário, sobre o estado padrão de teste.
pub fn build_test_app(pool: PgPool) -> Router {
    routes::router(test_state(pool))
}

// ---------------------------------------------------------------------------
// Dados
// ---------------------------------------------------------------------------

pub fn new_item(code: &str, initial_stock: i32) -> NewSupplyItem {
    NewSupplyItem {
        code: code.to_string(),
        name: format!("Item {code}"),
        category_id: None,
        unit: "pcs".to_string(),
        unit_price: rust_decimal::Decimal::from(1_000),
        initial_stock,
        min_stock: 5,
        max_stock: 100,
        supplier_id: None,
        location: None,
        description: None,
        is_active: true,
        created_by: Some("seed".to_string()),
    }
}

/// Cadastra um item com saldo inicial (lançado como IN pelo próprio serviço).
pub async fn seed_item(state: &AppState, code: &str, initial_stock: i32) -> SupplyItem {
    state
        .inventory_service
        .create_item(&state.db_pool, &new_item(code, initial_stock))
        .await
        .unwrap()
}

pub fn new_request(lines: &[(Uuid, i32)]) -> NewSupplyRequest {
    NewSupplyRequest {
        employee_id: Some("EMP-001".to_string()),
        employee_name: "Budi Santoso".to_string(),
        department: Some("Finance".to_string()),
        request_date: None,
        needed_date: None,
        purpose: Some("Reposição mensal".to_string()),
        notes: None,
        items: lines
            .iter()
            .map(|(item_id, quantity_requested)| NewRequestItem {
                item_id: *item_id,
                quantity_requested: *quantity_requested,
                quantity_approved: None,
                quantity_issued: None,
                notes: None,
            })
            .collect(),
    }
}

pub async fn seed_request(state: &AppState, lines: &[(Uuid, i32)]) -> SupplyRequest {
    state
        .request_service
        .create_request(&state.db_pool, &new_request(lines))
        .await
        .unwrap()
}

pub async fn current_stock(pool: &PgPool, item_id: Uuid) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT stock FROM supply_items WHERE id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn count_transactions(pool: &PgPool, item_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM supply_stock_transactions WHERE item_id = $1")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body.to_string())).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body.to_string())).await
}

/// POST com corpo cru, para testar JSON malformado.
pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(body.to_string())).await
}

async fn send(app: Router, method: Method, uri: &str, body: Option<String>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json)
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Confere status e envelope de erro de uma vez.
pub async fn assert_failure(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["message"].is_string());
    assert!(json.get("data").is_none());
    json
}
