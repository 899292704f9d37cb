// src/db/inventory_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;
use crate::{
    common::{
        db_utils::{is_foreign_key_violation, is_unique_violation},
        error::AppError,
    },
    models::inventory::{
        NewStockTransaction, NewSupplyCategory, NewSupplyItem, StockTransaction, SupplyCategory,
        SupplyItem, UpdateSupplyItem,
    },
};

const ITEM_SELECT: &str = r#"
    SELECT i.*, c.name AS category_name
    FROM supply_items i
    LEFT JOIN supply_categories c ON c.id = i.category_id
"#;

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---
    // Listagens são simples e usam a pool principal.

    pub async fn list_categories(&self) -> Result<Vec<SupplyCategory>, AppError> {
        let categories = sqlx::query_as::<_, SupplyCategory>(
            "SELECT * FROM supply_categories ORDER BY name ASC",
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn list_items(&self) -> Result<Vec<SupplyItem>, AppError> {
        let items = sqlx::query_as::<_, SupplyItem>(&format!("{ITEM_SELECT} ORDER BY i.name ASC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Itens ativos no mínimo ou abaixo dele, do mais crítico para o menos.
    pub async fn list_low_stock(&self) -> Result<Vec<SupplyItem>, AppError> {
        let items = sqlx::query_as::<_, SupplyItem>(&format!(
            "{ITEM_SELECT} WHERE i.is_active AND i.stock <= i.min_stock ORDER BY i.stock ASC, i.name ASC"
        ))
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Livro-razão, mais recentes primeiro, com o nome do item resolvido.
    pub async fn list_transactions(
        &self,
        item_id: Option<Uuid>,
    ) -> Result<Vec<StockTransaction>, AppError> {
        let transactions = sqlx::query_as::<_, StockTransaction>(
            r#"
            SELECT t.*, i.name AS item_name, i.code AS item_code
            FROM supply_stock_transactions t
            JOIN supply_items i ON i.id = t.item_id
            WHERE ($1::uuid IS NULL OR t.item_id = $1)
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(transactions)
    }

    pub async fn find_item<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
    ) -> Result<Option<SupplyItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, SupplyItem>(&format!("{ITEM_SELECT} WHERE i.id = $1"))
            .bind(item_id)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    /// Lê o saldo atual travando a linha (SELECT ... FOR UPDATE).
    /// Só faz sentido dentro de uma transação: segura escritas concorrentes
    /// no mesmo item até o COMMIT/ROLLBACK.
    pub async fn lock_item_stock<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
    ) -> Result<Option<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock = sqlx::query_scalar::<_, i32>(
            "SELECT stock FROM supply_items WHERE id = $1 FOR UPDATE",
        )
            .bind(item_id)
            .fetch_optional(executor)
            .await?;
        Ok(stock)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---
    // Estas usam o padrão genérico 'Executor' para rodar dentro de uma transação.

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        input: &NewSupplyCategory,
    ) -> Result<SupplyCategory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, SupplyCategory>(
            r#"
            INSERT INTO supply_categories (code, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return AppError::CodeAlreadyExists(input.code.clone());
                }
                e.into()
            })
    }

    /// Cria o item sempre com estoque zero; o saldo inicial entra pelo livro-razão.
    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        input: &NewSupplyItem,
    ) -> Result<SupplyItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, SupplyItem>(
            r#"
            INSERT INTO supply_items (
                code, name, category_id, unit, unit_price, stock,
                min_stock, max_stock, supplier_id, location, description, is_active
            )
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
            .bind(&input.code)
            .bind(&input.name)
            .bind(input.category_id)
            .bind(&input.unit)
            .bind(input.unit_price)
            .bind(input.min_stock)
            .bind(input.max_stock)
            .bind(input.supplier_id)
            .bind(&input.location)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_one(executor)
            .await
            .map_err(|e| map_item_write_error(e, &input.code, input.category_id))
    }

    pub async fn update_item<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        input: &UpdateSupplyItem,
    ) -> Result<Option<SupplyItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, SupplyItem>(
            r#"
            UPDATE supply_items SET
                code = $2, name = $3, category_id = $4, unit = $5, unit_price = $6,
                min_stock = $7, max_stock = $8, supplier_id = $9, location = $10,
                description = $11, is_active = $12, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(item_id)
            .bind(&input.code)
            .bind(&input.name)
            .bind(input.category_id)
            .bind(&input.unit)
            .bind(input.unit_price)
            .bind(input.min_stock)
            .bind(input.max_stock)
            .bind(input.supplier_id)
            .bind(&input.location)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_item_write_error(e, &input.code, input.category_id))
    }

    pub async fn delete_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM supply_items WHERE id = $1")
            .bind(item_id)
            .execute(executor)
            .await
            .map_err(|e| {
                // Movimentações e linhas de pedido seguram o item (ON DELETE RESTRICT)
                if is_foreign_key_violation(&e, None) {
                    return AppError::ItemInUse(item_id);
                }
                AppError::from(e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_stock<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        new_stock: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE supply_items SET stock = $2, updated_at = now() WHERE id = $1",
        )
            .bind(item_id)
            .bind(new_stock)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ItemNotFound(item_id));
        }
        Ok(())
    }

    /// Registra uma movimentação no livro-razão (append-only).
    pub async fn insert_transaction<'e, E>(
        &self,
        executor: E,
        input: &NewStockTransaction,
        previous_stock: i32,
        new_stock: i32,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, StockTransaction>(
            r#"
            INSERT INTO supply_stock_transactions (
                item_id, transaction_type, quantity, previous_stock, new_stock,
                reference_type, reference_id, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
            .bind(input.item_id)
            .bind(input.transaction_type)
            .bind(input.quantity)
            .bind(previous_stock)
            .bind(new_stock)
            .bind(&input.reference_type)
            .bind(input.reference_id)
            .bind(&input.notes)
            .bind(&input.created_by)
            .fetch_one(executor)
            .await?;

        Ok(transaction)
    }
}

fn map_item_write_error(e: sqlx::Error, code: &str, category_id: Option<Uuid>) -> AppError {
    if is_unique_violation(&e) {
        return AppError::CodeAlreadyExists(code.to_string());
    }
    if let Some(category_id) = category_id {
        if is_foreign_key_violation(&e, Some("category_id")) {
            return AppError::CategoryNotFound(category_id);
        }
    }
    e.into()
}
