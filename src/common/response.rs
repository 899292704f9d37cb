// src/common/response.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Envelope padrão de todas as respostas: `{ success, message, data? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self { success: true, message: message.into(), data: Some(data) }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), data: None }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// Atalhos usados pelos handlers
pub fn ok<T: Serialize>(message: &str, data: T) -> (StatusCode, ApiResponse<T>) {
    (StatusCode::OK, ApiResponse::ok(message, data))
}

pub fn created<T: Serialize>(message: &str, data: T) -> (StatusCode, ApiResponse<T>) {
    (StatusCode::CREATED, ApiResponse::ok(message, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_omits_data() {
        let body = serde_json::to_value(ApiResponse::<()>::failure("falhou")).unwrap();
        assert_eq!(body, json!({ "success": false, "message": "falhou" }));
    }

    #[test]
    fn success_carries_data() {
        let body = serde_json::to_value(ApiResponse::ok("ok", vec![1, 2])).unwrap();
        assert_eq!(body, json!({ "success": true, "message": "ok", "data": [1, 2] }));
    }
}
