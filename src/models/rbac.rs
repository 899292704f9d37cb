// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use utoipa::ToSchema;
use validator::Validate;

// O que sai do banco (Tabela approval_roles)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRole {
    pub id: Uuid,

    // Comparado com o `approvedBy` das aprovações
    #[schema(example = "alice")]
    pub user_name: String,

    #[schema(example = "Approver")]
    pub role_name: String,

    // NULL = sem limite
    #[schema(value_type = Option<f64>, example = 5000000.0)]
    pub approval_limit: Option<Decimal>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApprovalRole {
    pub fn allows(&self, total_value: Decimal) -> bool {
        match self.approval_limit {
            Some(limit) => total_value <= limit,
            None => true,
        }
    }
}

fn default_active() -> bool { true }

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewApprovalRole {
    #[validate(length(min = 1, max = 100, message = "O usuário é obrigatório."))]
    pub user_name: String,

    #[validate(length(min = 1, max = 60, message = "O cargo é obrigatório."))]
    pub role_name: String,

    #[schema(value_type = Option<f64>)]
    pub approval_limit: Option<Decimal>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApprovalRole {
    #[validate(length(min = 1, max = 60))]
    pub role_name: String,

    #[schema(value_type = Option<f64>)]
    pub approval_limit: Option<Decimal>,

    pub is_active: bool,
}
