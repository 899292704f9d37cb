// src/handlers/health.rs

use axum::{extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::{error::AppError, response::ok},
    config::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
}

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Sistema",
    responses(
        (status = 200, description = "Servidor e banco respondendo", body = HealthStatus),
        (status = 500, description = "Banco indisponível")
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    sqlx::query("SELECT 1").execute(&app_state.db_pool).await?;

    Ok(ok("OK", HealthStatus { status: "ok".into(), database: "ok".into() }))
}
