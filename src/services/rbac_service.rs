// src/services/rbac_service.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;
use crate::common::error::AppError;
use crate::db::RbacRepository;
use crate::models::rbac::{ApprovalRole, NewApprovalRole, UpdateApprovalRole};

// ---
// Política de aprovação (injetada no RequestService)
// ---

/// Uma linha já resolvida e precificada, como a política a enxerga.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub line_id: Uuid,
    pub item_id: Uuid,
    pub quantity_approved: i32,
    pub unit_price: Decimal,
}

impl PricedLine {
    pub fn value(&self) -> Decimal {
        Decimal::from(self.quantity_approved) * self.unit_price
    }
}

#[derive(Debug, Clone)]
pub struct ApprovalContext {
    pub request_id: Uuid,
    pub request_number: String,
    pub approved_by: String,
    pub lines: Vec<PricedLine>,
}

impl ApprovalContext {
    pub fn total_value(&self) -> Decimal {
        self.lines.iter().map(PricedLine::value).sum()
    }
}

/// Chamado antes do COMMIT da aprovação, na mesma conexão da transação.
/// Um `Err` desfaz tudo.
#[async_trait]
pub trait ApprovalPolicy: Send + Sync {
    async fn authorize(&self, conn: &mut PgConnection, ctx: &ApprovalContext) -> Result<(), AppError>;
}

/// Aprova sem consultar nada.
pub struct AllowAll;

#[async_trait]
impl ApprovalPolicy for AllowAll {
    async fn authorize(&self, _conn: &mut PgConnection, _ctx: &ApprovalContext) -> Result<(), AppError> {
        Ok(())
    }
}

/// Exige que `approvedBy` tenha um cargo ativo cujo limite cubra o valor aprovado.
#[derive(Clone)]
pub struct RoleApprovalLimit {
    repo: RbacRepository,
}

impl RoleApprovalLimit {
    pub fn new(repo: RbacRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ApprovalPolicy for RoleApprovalLimit {
    async fn authorize(&self, conn: &mut PgConnection, ctx: &ApprovalContext) -> Result<(), AppError> {
        let role = self.repo
            .find_active_role(conn, &ctx.approved_by)
            .await?
            .ok_or_else(|| AppError::ApproverNotAuthorized(ctx.approved_by.clone()))?;

        check_role_limit(&role, ctx)
    }
}

fn check_role_limit(role: &ApprovalRole, ctx: &ApprovalContext) -> Result<(), AppError> {
    let total = ctx.total_value();
    if role.allows(total) {
        return Ok(());
    }

    tracing::warn!(
        approver = %ctx.approved_by,
        request = %ctx.request_number,
        %total,
        "Aprovação acima do limite do cargo"
    );
    Err(AppError::ApprovalLimitExceeded {
        approver: ctx.approved_by.clone(),
        limit: role.approval_limit.map(|l| l.to_string()).unwrap_or_default(),
        total: total.to_string(),
    })
}

// ---
// Cadastro de cargos
// ---

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
}

impl RbacService {
    pub fn new(repo: RbacRepository) -> Self {
        Self { repo }
    }

    pub async fn list_roles(&self) -> Result<Vec<ApprovalRole>, AppError> {
        self.repo.list_roles().await
    }

    pub async fn create_role<'e, E>(&self, executor: E, input: &NewApprovalRole) -> Result<ApprovalRole, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_role(executor, input).await
    }

    pub async fn update_role<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        input: &UpdateApprovalRole,
    ) -> Result<ApprovalRole, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update_role(executor, role_id, input)
            .await?
            .ok_or(AppError::RoleNotFound(role_id))
    }
}
