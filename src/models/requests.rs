// src/models/requests.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};
use utoipa::ToSchema;
use validator::Validate;

// --- Enums ---
// Mesmo enum para o cabeçalho e para as linhas (a linha espelha o pedido).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "supply_request_status")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// Monta o número legível do pedido: `REQ-2026-007`.
pub fn format_request_number(year: i32, sequence: i32) -> String {
    format!("REQ-{year}-{sequence:03}")
}

// --- Structs de leitura ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyRequest {
    pub id: Uuid,
    #[schema(example = "REQ-2026-001")]
    pub request_number: String,
    pub employee_id: Option<String>,
    #[schema(example = "Budi Santoso")]
    pub employee_name: String,
    #[schema(example = "Finance")]
    pub department: Option<String>,
    pub request_date: NaiveDate,
    pub needed_date: Option<NaiveDate>,
    pub purpose: Option<String>,
    pub status: RequestStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Carregado à parte (segunda query)
    #[sqlx(skip)]
    pub items: Vec<RequestItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestItem {
    pub id: Uuid,
    pub request_id: Uuid,
    pub line_no: i32,
    pub item_id: Uuid,
    pub quantity_requested: i32,
    pub quantity_approved: i32,
    pub quantity_issued: i32,
    pub status: RequestStatus,
    pub notes: Option<String>,

    // Dados do item de ATK para exibição
    #[sqlx(default)]
    pub item_name: Option<String>,
    #[sqlx(default)]
    pub item_code: Option<String>,
    #[sqlx(default)]
    pub unit: Option<String>,
    #[sqlx(default)]
    pub available_stock: Option<i32>,
}

// --- Structs de entrada ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplyRequest {
    #[validate(length(max = 50))]
    pub employee_id: Option<String>,

    #[validate(length(min = 1, max = 120, message = "O nome do solicitante é obrigatório."))]
    pub employee_name: String,

    pub department: Option<String>,

    // Sem data: o banco usa CURRENT_DATE
    pub request_date: Option<NaiveDate>,
    pub needed_date: Option<NaiveDate>,
    pub purpose: Option<String>,
    pub notes: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<NewRequestItem>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewRequestItem {
    pub item_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade solicitada deve ser maior que zero."))]
    pub quantity_requested: i32,

    #[validate(range(min = 0))]
    pub quantity_approved: Option<i32>,

    #[validate(range(min = 0))]
    pub quantity_issued: Option<i32>,

    pub notes: Option<String>,
}

/// Uma linha do payload de aprovação.
/// Identifica a linha pelo `id` da linha ou pelo `itemId` do ATK;
/// sem `quantityApproved`, aprova o que foi solicitado.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalLine {
    pub id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub quantity_approved: Option<i32>,
}
