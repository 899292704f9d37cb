// src/services/inventory_service.rs

use crate::{
    common::error::AppError,
    config::NegativeStockPolicy,
    db::InventoryRepository,
    models::inventory::{
        NewStockTransaction, NewSupplyCategory, NewSupplyItem, StockTransaction, SupplyCategory,
        SupplyItem, TransactionKind, UpdateSupplyItem,
    },
};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

/// `reference_type` da entrada gerada no cadastro do item.
pub const REFERENCE_INITIAL: &str = "INITIAL";

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    negative_stock_policy: NegativeStockPolicy,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, negative_stock_policy: NegativeStockPolicy) -> Self {
        Self { inventory_repo, negative_stock_policy }
    }

    // --- LIVRO-RAZÃO ---

    /// Aplica uma movimentação ao saldo do item e grava o lançamento.
    ///
    /// Saldo e lançamento vão na mesma transação (um SAVEPOINT quando o
    /// chamador já está dentro de uma): nunca existe um sem o outro.
    /// O saldo anterior é lido com FOR UPDATE, então movimentações
    /// concorrentes no mesmo item entram em fila em vez de se sobrescreverem.
    #[tracing::instrument(skip(self, executor, input), fields(item_id = %input.item_id, kind = ?input.transaction_type, quantity = input.quantity))]
    pub async fn record_transaction<'e, E>(
        &self,
        executor: E,
        input: &NewStockTransaction,
    ) -> Result<StockTransaction, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        if input.quantity < 0 {
            return Err(AppError::InvalidQuantity(input.quantity));
        }

        let mut tx = executor.begin().await?;

        // 1. Saldo atual (linha travada)
        let previous_stock = self.inventory_repo
            .lock_item_stock(&mut *tx, input.item_id)
            .await?
            .ok_or(AppError::ItemNotFound(input.item_id))?;

        // 2. Novo saldo
        let new_stock = input
            .transaction_type
            .apply(previous_stock, input.quantity)
            .ok_or(AppError::StockOutOfRange {
                item_id: input.item_id,
                previous: previous_stock,
                quantity: input.quantity,
            })?;

        if new_stock < 0 {
            match self.negative_stock_policy {
                NegativeStockPolicy::Reject => {
                    return Err(AppError::InsufficientStock {
                        item_id: input.item_id,
                        available: previous_stock,
                        requested: input.quantity,
                    });
                }
                NegativeStockPolicy::Warn => {
                    tracing::warn!(
                        previous_stock,
                        new_stock,
                        "⚠️ Saldo do item ficará negativo"
                    );
                }
            }
        }

        // 3. Atualiza saldo
        self.inventory_repo.set_stock(&mut *tx, input.item_id, new_stock).await?;

        // 4. Grava Histórico
        let transaction = self.inventory_repo
            .insert_transaction(&mut *tx, input, previous_stock, new_stock)
            .await?;

        tx.commit().await?;

        tracing::info!(transaction_id = %transaction.id, previous_stock, new_stock, "Movimentação de estoque registrada");
        Ok(transaction)
    }

    pub async fn list_transactions(&self, item_id: Option<Uuid>) -> Result<Vec<StockTransaction>, AppError> {
        self.inventory_repo.list_transactions(item_id).await
    }

    // --- CATEGORIAS ---

    pub async fn list_categories(&self) -> Result<Vec<SupplyCategory>, AppError> {
        self.inventory_repo.list_categories().await
    }

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        input: &NewSupplyCategory,
    ) -> Result<SupplyCategory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.create_category(executor, input).await
    }

    // --- ITENS ---

    pub async fn list_items(&self) -> Result<Vec<SupplyItem>, AppError> {
        self.inventory_repo.list_items().await
    }

    pub async fn list_low_stock(&self) -> Result<Vec<SupplyItem>, AppError> {
        self.inventory_repo.list_low_stock().await
    }

    pub async fn get_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<SupplyItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .find_item(executor, item_id)
            .await?
            .ok_or(AppError::ItemNotFound(item_id))
    }

    /// Cadastra o item; o estoque inicial entra como IN no livro-razão,
    /// na mesma transação do cadastro.
    pub async fn create_item<'e, E>(
        &self,
        executor: E,
        input: &NewSupplyItem,
    ) -> Result<SupplyItem, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        if input.initial_stock < 0 {
            return Err(AppError::InvalidQuantity(input.initial_stock));
        }

        let mut tx = executor.begin().await?;

        let new_item = self.inventory_repo.insert_item(&mut *tx, input).await?;

        if input.initial_stock > 0 {
            let entry = NewStockTransaction {
                item_id: new_item.id,
                transaction_type: TransactionKind::In,
                quantity: input.initial_stock,
                reference_type: Some(REFERENCE_INITIAL.to_string()),
                reference_id: Some(new_item.id),
                notes: Some("Estoque inicial".to_string()),
                created_by: input.created_by.clone().unwrap_or_else(|| "system".to_string()),
            };
            self.record_transaction(&mut *tx, &entry).await?;
        }

        // Relê com o saldo atualizado e o nome da categoria
        let item = self.get_item(&mut *tx, new_item.id).await?;

        tx.commit().await?;
        Ok(item)
    }

    pub async fn update_item<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        input: &UpdateSupplyItem,
    ) -> Result<SupplyItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .update_item(executor, item_id, input)
            .await?
            .ok_or(AppError::ItemNotFound(item_id))
    }

    pub async fn delete_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.inventory_repo.delete_item(executor, item_id).await? {
            return Err(AppError::ItemNotFound(item_id));
        }
        Ok(())
    }
}
