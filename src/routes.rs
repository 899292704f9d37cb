// src/routes.rs

use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

/// Router completo da aplicação. O `main` e os testes de integração usam este mesmo builder.
pub fn router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_allowed_origins);

    let atk_routes = Router::new()
        .route(
            "/categories",
            get(handlers::inventory::list_categories).post(handlers::inventory::create_category),
        )
        .route(
            "/items",
            get(handlers::inventory::list_items).post(handlers::inventory::create_item),
        )
        .route("/items/low-stock", get(handlers::inventory::list_low_stock))
        .route(
            "/items/{id}",
            get(handlers::inventory::get_item)
                .put(handlers::inventory::update_item)
                .delete(handlers::inventory::delete_item),
        )
        .route(
            "/transactions",
            get(handlers::inventory::list_transactions).post(handlers::inventory::create_transaction),
        )
        .route(
            "/requests",
            get(handlers::requests::list_requests).post(handlers::requests::create_request),
        )
        .route(
            "/requests/{id}",
            get(handlers::requests::get_request).delete(handlers::requests::delete_request),
        )
        .route("/requests/{id}/approve", post(handlers::requests::approve_request))
        .route("/requests/{id}/reject", post(handlers::requests::reject_request));

    let role_routes = Router::new()
        .route("/", get(handlers::rbac::list_roles).post(handlers::rbac::create_role))
        .route("/{id}", put(handlers::rbac::update_role));

    Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .nest("/api/atk", atk_routes)
        .nest("/api/roles", role_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Lista vazia libera qualquer origem (ambiente de desenvolvimento).
/// Origens que não são cabeçalhos válidos são ignoradas com aviso.
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%origin, error = %e, "Origem CORS inválida ignorada");
                None
            }
        })
        .collect();

    layer.allow_origin(parsed)
}
