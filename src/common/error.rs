use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::common::response::ApiResponse;
use crate::models::requests::RequestStatus;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Toda falha vira o envelope `{ success: false, message }`.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Entrada malformada ---
    #[error("Corpo da requisição inválido: {0}")]
    MalformedInput(String),

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Quantidade inválida: {0}")]
    InvalidQuantity(i32),

    // --- Não encontrado ---
    #[error("Item de ATK {0} não encontrado")]
    ItemNotFound(Uuid),

    #[error("Categoria {0} não encontrada")]
    CategoryNotFound(Uuid),

    #[error("Pedido {0} não encontrado")]
    RequestNotFound(Uuid),

    #[error("Linha do pedido não encontrada: {0}")]
    RequestLineNotFound(String),

    #[error("Cargo de aprovação {0} não encontrado")]
    RoleNotFound(Uuid),

    // --- Conflitos ---
    #[error("Já existe um registro com o código '{0}'")]
    CodeAlreadyExists(String),

    #[error("Pedido {id} já foi processado (status {status:?})")]
    RequestAlreadyProcessed { id: Uuid, status: RequestStatus },

    #[error("Estoque insuficiente para o item {item_id}: saldo {available}, saída de {requested}")]
    InsufficientStock { item_id: Uuid, available: i32, requested: i32 },

    #[error("Item de ATK {0} possui movimentações ou pedidos e não pode ser removido")]
    ItemInUse(Uuid),

    // --- Regras de negócio ---
    #[error("Quantidade aprovada ({approved}) maior que a solicitada ({requested}) na linha {line_id}")]
    OverApproval { line_id: Uuid, requested: i32, approved: i32 },

    #[error("A linha {0} aparece mais de uma vez na aprovação")]
    DuplicateApprovalLine(Uuid),

    #[error("Saldo do item {item_id} fora do limite: saldo {previous}, movimentação de {quantity}")]
    StockOutOfRange { item_id: Uuid, previous: i32, quantity: i32 },

    // --- Política de aprovação ---
    #[error("Usuário '{0}' não possui cargo de aprovação ativo")]
    ApproverNotAuthorized(String),

    #[error("Valor do pedido ({total}) excede o limite de aprovação de '{approver}' ({limit})")]
    ApprovalLimitExceeded { approver: String, limit: String, total: String },

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MalformedInput(_)
            | AppError::ValidationError(_)
            | AppError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,

            AppError::ItemNotFound(_)
            | AppError::CategoryNotFound(_)
            | AppError::RequestNotFound(_)
            | AppError::RequestLineNotFound(_)
            | AppError::RoleNotFound(_)
            | AppError::DatabaseError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,

            AppError::CodeAlreadyExists(_)
            | AppError::RequestAlreadyProcessed { .. }
            | AppError::InsufficientStock { .. }
            | AppError::ItemInUse(_) => StatusCode::CONFLICT,

            AppError::OverApproval { .. }
            | AppError::DuplicateApprovalLine(_)
            | AppError::StockOutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            AppError::ApproverNotAuthorized(_) | AppError::ApprovalLimitExceeded { .. } => {
                StatusCode::FORBIDDEN
            }

            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Mensagem que vai para o cliente.
    fn public_message(&self) -> String {
        match self {
            // Junta os campos inválidos numa frase só (o envelope não tem `details`)
            AppError::ValidationError(errors) => {
                let mut fields: Vec<String> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, field_errors)| {
                        let messages: Vec<String> = field_errors
                            .iter()
                            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                            .collect();
                        if messages.is_empty() {
                            format!("{field}: inválido")
                        } else {
                            format!("{field}: {}", messages.join(", "))
                        }
                    })
                    .collect();
                fields.sort();
                if fields.is_empty() {
                    "Um ou mais campos são inválidos.".to_string()
                } else {
                    format!("Um ou mais campos são inválidos. {}", fields.join("; "))
                }
            }
            AppError::DatabaseError(sqlx::Error::RowNotFound) => "Registro não encontrado.".to_string(),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                "Ocorreu um erro inesperado.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // O `tracing` loga a mensagem detalhada; o cliente recebe a genérica.
        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "Requisição recusada: {}", self);
        }

        (status, ApiResponse::<()>::failure(self.public_message())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "obrigatório"))]
        name: String,
    }

    #[test]
    fn maps_error_kinds_to_http_status() {
        let id = Uuid::new_v4();
        assert_eq!(AppError::MalformedInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::ItemNotFound(id).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::RequestAlreadyProcessed { id, status: RequestStatus::Approved }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::OverApproval { line_id: id, requested: 1, approved: 2 }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::StockOutOfRange { item_id: id, previous: 10, quantity: i32::MAX }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::ApproverNotAuthorized("bob".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco: hunter2"));
        assert_eq!(err.public_message(), "Ocorreu um erro inesperado.");
    }

    #[test]
    fn validation_message_lists_fields() {
        let errors = Payload { name: String::new() }.validate().unwrap_err();
        let msg = AppError::from(errors).public_message();
        assert!(msg.contains("name: obrigatório"), "{msg}");
    }
}
