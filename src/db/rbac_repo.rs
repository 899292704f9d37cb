// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;
use crate::{
    common::{db_utils::is_unique_violation, error::AppError},
    models::rbac::{ApprovalRole, NewApprovalRole, UpdateApprovalRole},
};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_roles(&self) -> Result<Vec<ApprovalRole>, AppError> {
        let roles = sqlx::query_as::<_, ApprovalRole>(
            "SELECT * FROM approval_roles ORDER BY user_name ASC",
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    /// Busca o cargo ativo de um usuário (usado pela política de aprovação,
    /// dentro da transação da aprovação).
    pub async fn find_active_role<'e, E>(
        &self,
        executor: E,
        user_name: &str,
    ) -> Result<Option<ApprovalRole>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, ApprovalRole>(
            "SELECT * FROM approval_roles WHERE user_name = $1 AND is_active",
        )
            .bind(user_name)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        input: &NewApprovalRole,
    ) -> Result<ApprovalRole, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ApprovalRole>(
            r#"
            INSERT INTO approval_roles (user_name, role_name, approval_limit, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
            .bind(&input.user_name)
            .bind(&input.role_name)
            .bind(input.approval_limit)
            .bind(input.is_active)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return AppError::CodeAlreadyExists(input.user_name.clone());
                }
                e.into()
            })
    }

    pub async fn update_role<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        input: &UpdateApprovalRole,
    ) -> Result<Option<ApprovalRole>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, ApprovalRole>(
            r#"
            UPDATE approval_roles
            SET role_name = $2, approval_limit = $3, is_active = $4, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(role_id)
            .bind(&input.role_name)
            .bind(input.approval_limit)
            .bind(input.is_active)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }
}
