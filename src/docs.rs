// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "ATK Backend", description = "Estoque de material de escritório (ATK) e fluxo de pedidos"),
    paths(
        // --- Sistema ---
        handlers::health::health_check,

        // --- ATK ---
        handlers::inventory::list_categories,
        handlers::inventory::create_category,
        handlers::inventory::list_items,
        handlers::inventory::list_low_stock,
        handlers::inventory::get_item,
        handlers::inventory::create_item,
        handlers::inventory::update_item,
        handlers::inventory::delete_item,
        handlers::inventory::list_transactions,
        handlers::inventory::create_transaction,

        // --- Pedidos ---
        handlers::requests::list_requests,
        handlers::requests::create_request,
        handlers::requests::get_request,
        handlers::requests::delete_request,
        handlers::requests::approve_request,
        handlers::requests::reject_request,

        // --- Cargos ---
        handlers::rbac::list_roles,
        handlers::rbac::create_role,
        handlers::rbac::update_role,
    ),
    components(
        schemas(
            handlers::health::HealthStatus,

            // --- ATK ---
            models::inventory::SupplyCategory,
            models::inventory::NewSupplyCategory,
            models::inventory::SupplyItem,
            models::inventory::NewSupplyItem,
            models::inventory::UpdateSupplyItem,
            models::inventory::TransactionKind,
            models::inventory::StockTransaction,
            models::inventory::NewStockTransaction,

            // --- Pedidos ---
            models::requests::RequestStatus,
            models::requests::SupplyRequest,
            models::requests::RequestItem,
            models::requests::NewSupplyRequest,
            models::requests::NewRequestItem,
            models::requests::ApprovalLine,
            handlers::requests::ApproveRequestPayload,
            handlers::requests::RejectRequestPayload,

            // --- Cargos ---
            models::rbac::ApprovalRole,
            models::rbac::NewApprovalRole,
            models::rbac::UpdateApprovalRole,
        )
    ),
    tags(
        (name = "Sistema", description = "Saúde do serviço"),
        (name = "ATK", description = "Catálogo de ATK e livro-razão de estoque"),
        (name = "Pedidos", description = "Pedidos de ATK: submissão, aprovação e rejeição"),
        (name = "Cargos", description = "Cargos de aprovação e seus limites")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_the_workflow_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/health",
            "/api/atk/items/{id}",
            "/api/atk/transactions",
            "/api/atk/requests/{id}/approve",
            "/api/atk/requests/{id}/reject",
            "/api/roles/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "faltando {path}");
        }
    }
}
