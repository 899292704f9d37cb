// src/models/inventory.rs

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

// --- 1. Categorias de ATK ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyCategory {
    pub id: Uuid,
    #[schema(example = "ATK-KRT")]
    pub code: String,
    #[schema(example = "Kertas")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplyCategory {
    #[validate(length(min = 1, max = 30, message = "O código é obrigatório (máx. 30)."))]
    pub code: String,
    #[validate(length(min = 1, max = 120, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
}

// --- 2. Itens de ATK ---
// O saldo (`stock`) só muda através do livro-razão.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyItem {
    pub id: Uuid,
    #[schema(example = "ATK-001")]
    pub code: String,
    #[schema(example = "Kertas A4 80gr")]
    pub name: String,
    pub category_id: Option<Uuid>,
    #[schema(example = "rim")]
    pub unit: String,
    #[schema(value_type = f64, example = 55000.0)]
    pub unit_price: Decimal,
    pub stock: i32,
    pub min_stock: i32,
    pub max_stock: i32,
    pub supplier_id: Option<Uuid>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Só vem preenchido nas listagens (JOIN com supply_categories)
    #[sqlx(default)]
    pub category_name: Option<String>,
}

impl SupplyItem {
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

fn default_min_stock() -> i32 { 5 }
fn default_max_stock() -> i32 { 100 }
fn default_active() -> bool { true }

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplyItem {
    #[validate(length(min = 1, max = 30, message = "O código é obrigatório (máx. 30)."))]
    pub code: String,

    #[validate(length(min = 1, max = 160, message = "O nome é obrigatório."))]
    pub name: String,

    pub category_id: Option<Uuid>,

    #[validate(length(min = 1, max = 30, message = "A unidade é obrigatória."))]
    pub unit: String,

    #[serde(default)]
    #[schema(value_type = f64)]
    pub unit_price: Decimal,

    // Estoque inicial: gravado como uma entrada (IN) no livro-razão
    #[serde(default)]
    #[validate(range(min = 0, message = "O estoque inicial não pode ser negativo."))]
    pub initial_stock: i32,

    #[serde(default = "default_min_stock")]
    #[validate(range(min = 0))]
    pub min_stock: i32,

    #[serde(default = "default_max_stock")]
    #[validate(range(min = 0))]
    pub max_stock: i32,

    pub supplier_id: Option<Uuid>,
    pub location: Option<String>,
    pub description: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    // Quem cadastrou (vai para o created_by da entrada inicial)
    pub created_by: Option<String>,
}

/// Campos descritivos do item. Sem saldo: ele só muda pelo livro-razão.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupplyItem {
    #[validate(length(min = 1, max = 30))]
    pub code: String,
    #[validate(length(min = 1, max = 160))]
    pub name: String,
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 30))]
    pub unit: String,
    #[schema(value_type = f64)]
    pub unit_price: Decimal,
    #[validate(range(min = 0))]
    pub min_stock: i32,
    #[validate(range(min = 0))]
    pub max_stock: i32,
    pub supplier_id: Option<Uuid>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

// --- 3. Livro-razão de estoque ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_transaction_type", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum TransactionKind {
    In,         // "IN"  - entrada
    Out,        // "OUT" - saída
    Adjustment, // "ADJUSTMENT" - ajuste manual
    Stocktake,  // "STOCKTAKE"  - contagem física (stock opname)
}

impl TransactionKind {
    /// Calcula o saldo resultante a partir do saldo anterior.
    /// IN soma, OUT subtrai; ajuste e contagem tratam `quantity` como o saldo final.
    /// `None` quando o saldo não cabe em `i32`.
    pub fn apply(self, previous_stock: i32, quantity: i32) -> Option<i32> {
        match self {
            TransactionKind::In => previous_stock.checked_add(quantity),
            TransactionKind::Out => previous_stock.checked_sub(quantity),
            TransactionKind::Adjustment | TransactionKind::Stocktake => Some(quantity),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    pub id: Uuid,
    pub item_id: Uuid,
    pub transaction_type: TransactionKind,
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    #[schema(example = "REQUEST")]
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,

    // Preenchidos apenas na listagem
    #[sqlx(default)]
    pub item_name: Option<String>,
    #[sqlx(default)]
    pub item_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewStockTransaction {
    pub item_id: Uuid,

    #[schema(example = "IN")]
    pub transaction_type: TransactionKind,

    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity: i32,

    #[validate(length(max = 30))]
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,

    #[validate(length(min = 1, max = 100, message = "O campo 'createdBy' é obrigatório."))]
    pub created_by: String,
}
