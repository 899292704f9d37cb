// src/services/request_service.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, Utc};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryRepository, RequestRepository},
    models::{
        inventory::{NewStockTransaction, TransactionKind},
        requests::{
            format_request_number, ApprovalLine, NewSupplyRequest, RequestItem, RequestStatus,
            SupplyRequest,
        },
    },
    services::{
        inventory_service::InventoryService,
        rbac_service::{ApprovalContext, ApprovalPolicy, PricedLine},
    },
};

/// `reference_type` das saídas geradas por aprovação de pedido.
pub const REFERENCE_REQUEST: &str = "REQUEST";
pub const APPROVAL_NOTE: &str = "Request approved";

/// Linha do pedido já casada com o payload de aprovação.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    pub line_id: Uuid,
    pub item_id: Uuid,
    pub quantity_approved: i32,
}

#[derive(Clone)]
pub struct RequestService {
    repo: RequestRepository,
    inventory_repo: InventoryRepository,
    inventory_service: InventoryService,
    approval_policy: Arc<dyn ApprovalPolicy>,
}

impl RequestService {
    pub fn new(
        repo: RequestRepository,
        inventory_repo: InventoryRepository,
        inventory_service: InventoryService,
        approval_policy: Arc<dyn ApprovalPolicy>,
    ) -> Self {
        Self {
            repo,
            inventory_repo,
            inventory_service,
            approval_policy,
        }
    }

    // --- CONSULTAS ---

    /// Todos os pedidos (mais novos primeiro) com suas linhas.
    /// Duas queries no total: cabeçalhos e depois todas as linhas.
    pub async fn list_requests(&self) -> Result<Vec<SupplyRequest>, AppError> {
        let mut requests = self.repo.list_requests().await?;
        if requests.is_empty() {
            return Ok(requests);
        }

        let ids: Vec<Uuid> = requests.iter().map(|r| r.id).collect();
        let items = self.repo.list_request_items(&ids).await?;

        let mut by_request: HashMap<Uuid, Vec<RequestItem>> = HashMap::new();
        for item in items {
            by_request.entry(item.request_id).or_default().push(item);
        }
        for request in &mut requests {
            request.items = by_request.remove(&request.id).unwrap_or_default();
        }

        Ok(requests)
    }

    pub async fn get_request<'e, E>(&self, executor: E, request_id: Uuid) -> Result<SupplyRequest, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        self.load_request(&mut *conn, request_id).await
    }

    async fn load_request(
        &self,
        conn: &mut sqlx::PgConnection,
        request_id: Uuid,
    ) -> Result<SupplyRequest, AppError> {
        let mut request = self.repo
            .find_request(&mut *conn, request_id)
            .await?
            .ok_or(AppError::RequestNotFound(request_id))?;

        request.items = self.repo.list_items_for_requests(&mut *conn, &[request_id]).await?;
        Ok(request)
    }

    // --- SUBMISSÃO ---

    /// Cria cabeçalho + linhas numa única transação.
    /// Se qualquer linha falhar, o cabeçalho também é desfeito.
    #[tracing::instrument(skip(self, executor, input), fields(employee = %input.employee_name, lines = input.items.len()))]
    pub async fn create_request<'e, E>(
        &self,
        executor: E,
        input: &NewSupplyRequest,
    ) -> Result<SupplyRequest, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        if let Some(bad) = input.items.iter().find(|line| line.quantity_requested <= 0) {
            return Err(AppError::InvalidQuantity(bad.quantity_requested));
        }

        let mut tx = executor.begin().await?;

        // 1. Número do pedido
        let year = Utc::now().year();
        let sequence = self.repo.next_request_sequence(&mut *tx, year).await?;
        let request_number = format_request_number(year, sequence);

        // 2. Cabeçalho
        let request = self.repo.insert_request(&mut *tx, &request_number, input).await?;

        // 3. Linhas, na ordem recebida
        for (index, line) in input.items.iter().enumerate() {
            self.repo
                .insert_request_item(&mut *tx, request.id, index as i32 + 1, line)
                .await?;
        }

        let created = self.load_request(&mut *tx, request.id).await?;

        tx.commit().await?;

        tracing::info!(request_id = %created.id, number = %created.request_number, "Pedido de ATK criado");
        Ok(created)
    }

    // --- APROVAÇÃO ---

    /// Aprova o pedido e dá baixa no estoque de cada linha informada.
    ///
    /// Tudo numa transação: status do pedido, status/quantidade das linhas e
    /// uma saída (OUT) no livro-razão por linha. Qualquer erro desfaz tudo e o
    /// pedido continua `Pending`.
    #[tracing::instrument(skip(self, executor, lines), fields(lines = lines.len()))]
    pub async fn approve_request<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        approved_by: &str,
        lines: &[ApprovalLine],
    ) -> Result<SupplyRequest, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Trava o pedido e valida o estado
        let request = self.repo
            .find_request_for_update(&mut *tx, request_id)
            .await?
            .ok_or(AppError::RequestNotFound(request_id))?;

        if request.status.is_terminal() {
            return Err(AppError::RequestAlreadyProcessed { id: request_id, status: request.status });
        }

        // 2. Casa o payload com as linhas do pedido
        let request_lines = self.repo.lock_request_items(&mut *tx, request_id).await?;
        let resolved = resolve_approval_lines(&request_lines, lines)?;

        // 3. Política de aprovação (limite por cargo etc.)
        let mut priced = Vec::with_capacity(resolved.len());
        for line in &resolved {
            let item = self.inventory_repo
                .find_item(&mut *tx, line.item_id)
                .await?
                .ok_or(AppError::ItemNotFound(line.item_id))?;
            priced.push(PricedLine {
                line_id: line.line_id,
                item_id: line.item_id,
                quantity_approved: line.quantity_approved,
                unit_price: item.unit_price,
            });
        }

        let ctx = ApprovalContext {
            request_id,
            request_number: request.request_number.clone(),
            approved_by: approved_by.to_string(),
            lines: priced,
        };
        self.approval_policy.authorize(&mut *tx, &ctx).await?;

        // 4. Cabeçalho
        self.repo
            .mark_request_decided(&mut *tx, request_id, RequestStatus::Approved, approved_by, None)
            .await?;

        // 5. Linhas + baixa no estoque, na ordem do payload
        for line in &resolved {
            self.repo.approve_line(&mut *tx, line.line_id, line.quantity_approved).await?;

            let movement = NewStockTransaction {
                item_id: line.item_id,
                transaction_type: TransactionKind::Out,
                quantity: line.quantity_approved,
                reference_type: Some(REFERENCE_REQUEST.to_string()),
                reference_id: Some(request_id),
                notes: Some(APPROVAL_NOTE.to_string()),
                created_by: approved_by.to_string(),
            };
            self.inventory_service.record_transaction(&mut *tx, &movement).await?;
        }

        let approved = self.load_request(&mut *tx, request_id).await?;

        tx.commit().await?;

        tracing::info!(number = %approved.request_number, %approved_by, "Pedido de ATK aprovado");
        Ok(approved)
    }

    // --- REJEIÇÃO ---

    /// Rejeita o pedido e todas as linhas, sem tocar no estoque.
    #[tracing::instrument(skip(self, executor, reason))]
    pub async fn reject_request<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        rejected_by: &str,
        reason: &str,
    ) -> Result<SupplyRequest, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let request = self.repo
            .find_request_for_update(&mut *tx, request_id)
            .await?
            .ok_or(AppError::RequestNotFound(request_id))?;

        if request.status.is_terminal() {
            return Err(AppError::RequestAlreadyProcessed { id: request_id, status: request.status });
        }

        self.repo
            .mark_request_decided(&mut *tx, request_id, RequestStatus::Rejected, rejected_by, Some(reason))
            .await?;
        self.repo.set_lines_status(&mut *tx, request_id, RequestStatus::Rejected).await?;

        let rejected = self.load_request(&mut *tx, request_id).await?;

        tx.commit().await?;

        tracing::info!(number = %rejected.request_number, %rejected_by, "Pedido de ATK rejeitado");
        Ok(rejected)
    }

    // --- REMOÇÃO ---

    pub async fn delete_request<'e, E>(&self, executor: E, request_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_request(executor, request_id).await? {
            return Err(AppError::RequestNotFound(request_id));
        }
        Ok(())
    }
}

/// Casa cada linha do payload com uma linha do pedido (por `id` ou `itemId`)
/// e define a quantidade aprovada.
pub fn resolve_approval_lines(
    request_lines: &[RequestItem],
    lines: &[ApprovalLine],
) -> Result<Vec<ResolvedLine>, AppError> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(lines.len());

    for line in lines {
        let found = match (line.id, line.item_id) {
            (Some(id), item_id) => request_lines
                .iter()
                .find(|l| l.id == id && item_id.is_none_or(|item_id| l.item_id == item_id))
                .ok_or_else(|| AppError::RequestLineNotFound(id.to_string()))?,
            // Mesmo item em várias linhas: pega a primeira ainda não casada.
            (None, Some(item_id)) => {
                let mut same_item = request_lines.iter().filter(|l| l.item_id == item_id);
                match same_item.clone().find(|l| !seen.contains(&l.id)) {
                    Some(found) => found,
                    None => {
                        return Err(match same_item.next() {
                            Some(taken) => AppError::DuplicateApprovalLine(taken.id),
                            None => AppError::RequestLineNotFound(format!("itemId {item_id}")),
                        });
                    }
                }
            }
            (None, None) => {
                return Err(AppError::RequestLineNotFound(
                    "linha sem 'id' nem 'itemId'".to_string(),
                ));
            }
        };

        if !seen.insert(found.id) {
            return Err(AppError::DuplicateApprovalLine(found.id));
        }

        let quantity_approved = line.quantity_approved.unwrap_or(found.quantity_requested);
        if quantity_approved < 0 {
            return Err(AppError::InvalidQuantity(quantity_approved));
        }
        if quantity_approved > found.quantity_requested {
            return Err(AppError::OverApproval {
                line_id: found.id,
                requested: found.quantity_requested,
                approved: quantity_approved,
            });
        }

        resolved.push(ResolvedLine {
            line_id: found.id,
            item_id: found.item_id,
            quantity_approved,
        });
    }

    Ok(resolved)
}
