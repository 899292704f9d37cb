// src/db/requests_repo.rs

use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;
use crate::{
    common::{db_utils::is_foreign_key_violation, error::AppError},
    models::requests::{NewRequestItem, NewSupplyRequest, RequestItem, RequestStatus, SupplyRequest},
};

#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  NUMERAÇÃO
    // =========================================================================

    /// Próximo sequencial do ano. O UPSERT trava a linha do contador,
    /// então dois pedidos simultâneos nunca recebem o mesmo número.
    pub async fn next_request_sequence<'e, E>(&self, executor: E, year: i32) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sequence = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO supply_request_counters (year, last_value)
            VALUES ($1, 1)
            ON CONFLICT (year)
            DO UPDATE SET last_value = supply_request_counters.last_value + 1
            RETURNING last_value
            "#,
        )
            .bind(year)
            .fetch_one(executor)
            .await?;

        Ok(sequence)
    }

    // =========================================================================
    //  PEDIDOS
    // =========================================================================

    pub async fn insert_request<'e, E>(
        &self,
        executor: E,
        request_number: &str,
        input: &NewSupplyRequest,
    ) -> Result<SupplyRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, SupplyRequest>(
            r#"
            INSERT INTO supply_requests (
                request_number, employee_id, employee_name, department,
                request_date, needed_date, purpose, status, notes
            )
            VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_DATE), $6, $7, 'Pending', $8)
            RETURNING *
            "#,
        )
            .bind(request_number)
            .bind(&input.employee_id)
            .bind(&input.employee_name)
            .bind(&input.department)
            .bind(input.request_date)
            .bind(input.needed_date)
            .bind(&input.purpose)
            .bind(&input.notes)
            .fetch_one(executor)
            .await?;

        Ok(request)
    }

    pub async fn insert_request_item<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        line_no: i32,
        input: &NewRequestItem,
    ) -> Result<RequestItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, RequestItem>(
            r#"
            INSERT INTO supply_request_items (
                request_id, line_no, item_id, quantity_requested,
                quantity_approved, quantity_issued, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'Pending', $7)
            RETURNING *
            "#,
        )
            .bind(request_id)
            .bind(line_no)
            .bind(input.item_id)
            .bind(input.quantity_requested)
            .bind(input.quantity_approved.unwrap_or(0))
            .bind(input.quantity_issued.unwrap_or(0))
            .bind(&input.notes)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e, Some("item_id")) {
                    return AppError::ItemNotFound(input.item_id);
                }
                e.into()
            })
    }

    pub async fn find_request<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Option<SupplyRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, SupplyRequest>("SELECT * FROM supply_requests WHERE id = $1")
            .bind(request_id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    /// Trava o cabeçalho do pedido até o fim da transação.
    /// Duas aprovações simultâneas do mesmo pedido ficam em fila aqui.
    pub async fn find_request_for_update<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Option<SupplyRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, SupplyRequest>(
            "SELECT * FROM supply_requests WHERE id = $1 FOR UPDATE",
        )
            .bind(request_id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    pub async fn list_requests(&self) -> Result<Vec<SupplyRequest>, AppError> {
        let requests = sqlx::query_as::<_, SupplyRequest>(
            "SELECT * FROM supply_requests ORDER BY created_at DESC, request_number DESC",
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(requests)
    }

    pub async fn list_request_items(&self, request_ids: &[Uuid]) -> Result<Vec<RequestItem>, AppError> {
        self.list_items_for_requests(&self.pool, request_ids).await
    }

    /// Linhas de vários pedidos de uma vez, já com os dados do item de ATK.
    pub async fn list_items_for_requests<'e, E>(
        &self,
        executor: E,
        request_ids: &[Uuid],
    ) -> Result<Vec<RequestItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, RequestItem>(
            r#"
            SELECT ri.*,
                   i.name  AS item_name,
                   i.code  AS item_code,
                   i.unit  AS unit,
                   i.stock AS available_stock
            FROM supply_request_items ri
            JOIN supply_items i ON i.id = ri.item_id
            WHERE ri.request_id = ANY($1)
            ORDER BY ri.request_id, ri.line_no
            "#,
        )
            .bind(request_ids)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    pub async fn lock_request_items<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
    ) -> Result<Vec<RequestItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, RequestItem>(
            "SELECT * FROM supply_request_items WHERE request_id = $1 ORDER BY line_no FOR UPDATE",
        )
            .bind(request_id)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    // =========================================================================
    //  TRANSIÇÕES
    // =========================================================================

    /// Grava a decisão no cabeçalho. `approved_by` guarda também quem rejeitou.
    pub async fn mark_request_decided<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        status: RequestStatus,
        decided_by: &str,
        rejection_reason: Option<&str>,
    ) -> Result<SupplyRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, SupplyRequest>(
            r#"
            UPDATE supply_requests SET
                status = $2,
                approved_by = $3,
                approved_at = now(),
                rejection_reason = $4,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(request_id)
            .bind(status)
            .bind(decided_by)
            .bind(rejection_reason)
            .fetch_optional(executor)
            .await?;

        request.ok_or(AppError::RequestNotFound(request_id))
    }

    pub async fn approve_line<'e, E>(
        &self,
        executor: E,
        line_id: Uuid,
        quantity_approved: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE supply_request_items
            SET quantity_approved = $2, status = 'Approved'
            WHERE id = $1
            "#,
        )
            .bind(line_id)
            .bind(quantity_approved)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RequestLineNotFound(line_id.to_string()));
        }
        Ok(())
    }

    pub async fn set_lines_status<'e, E>(
        &self,
        executor: E,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE supply_request_items SET status = $2 WHERE request_id = $1")
            .bind(request_id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove o pedido; as linhas vão junto (ON DELETE CASCADE).
    pub async fn delete_request<'e, E>(&self, executor: E, request_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM supply_requests WHERE id = $1")
            .bind(request_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
