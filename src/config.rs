// src/config.rs

use crate::{
    db::{InventoryRepository, RbacRepository, RequestRepository},
    services::{
        inventory_service::InventoryService,
        rbac_service::{AllowAll, ApprovalPolicy, RbacService, RoleApprovalLimit},
        request_service::RequestService,
    },
};
use anyhow::{bail, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, str::FromStr, sync::Arc, time::Duration};

/// O que fazer quando uma movimentação deixaria o saldo negativo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegativeStockPolicy {
    /// Grava mesmo assim e emite um `warn!` (comportamento histórico).
    #[default]
    Warn,
    /// Recusa a movimentação com `InsufficientStock`.
    Reject,
}

impl FromStr for NegativeStockPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" | "allow" => Ok(Self::Warn),
            "reject" => Ok(Self::Reject),
            other => bail!("NEGATIVE_STOCK_POLICY inválida: '{other}' (use warn|reject)"),
        }
    }
}

/// Qual política de aprovação injetar no RequestService.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalPolicyKind {
    #[default]
    None,
    RoleLimit,
}

impl FromStr for ApprovalPolicyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "role_limit" => Ok(Self::RoleLimit),
            other => bail!("APPROVAL_POLICY inválida: '{other}' (use none|role_limit)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub negative_stock_policy: NegativeStockPolicy,
    pub approval_policy: ApprovalPolicyKind,
    // Vazio = qualquer origem
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let server_addr = get("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let db_max_connections = get("DB_MAX_CONNECTIONS")
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("DB_MAX_CONNECTIONS deve ser um número")?
            .unwrap_or(5);

        let acquire_secs = get("DB_ACQUIRE_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("DB_ACQUIRE_TIMEOUT_SECS deve ser um número")?
            .unwrap_or(3);

        let negative_stock_policy = get("NEGATIVE_STOCK_POLICY")
            .map(|v| v.parse::<NegativeStockPolicy>())
            .transpose()?
            .unwrap_or_default();

        let approval_policy = get("APPROVAL_POLICY")
            .map(|v| v.parse::<ApprovalPolicyKind>())
            .transpose()?
            .unwrap_or_default();

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty() && *o != "*")
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            server_addr,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            negative_stock_policy,
            approval_policy,
            cors_allowed_origins,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub inventory_service: InventoryService,
    pub request_service: RequestService,
    pub rbac_service: RbacService,
}

impl AppState {
    // A assinatura retorna um Result: quem decide se aborta é o main.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config))
    }

    /// Monta o estado sobre uma pool já aberta, com a política de aprovação da config.
    pub fn from_pool(db_pool: PgPool, config: Config) -> Self {
        let approval_policy: Arc<dyn ApprovalPolicy> = match config.approval_policy {
            ApprovalPolicyKind::None => Arc::new(AllowAll),
            ApprovalPolicyKind::RoleLimit => {
                Arc::new(RoleApprovalLimit::new(RbacRepository::new(db_pool.clone())))
            }
        };
        Self::with_approval_policy(db_pool, config, approval_policy)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_approval_policy(
        db_pool: PgPool,
        config: Config,
        approval_policy: Arc<dyn ApprovalPolicy>,
    ) -> Self {
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let request_repo = RequestRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());

        let inventory_service =
            InventoryService::new(inventory_repo.clone(), config.negative_stock_policy);
        let request_service = RequestService::new(
            request_repo,
            inventory_repo,
            inventory_service.clone(),
            approval_policy,
        );
        let rbac_service = RbacService::new(rbac_repo);

        Self {
            db_pool,
            config: Arc::new(config),
            inventory_service,
            request_service,
            rbac_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/atk")])).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8080");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.negative_stock_policy, NegativeStockPolicy::Warn);
        assert_eq!(config.approval_policy, ApprovalPolicyKind::None);
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn database_url_is_required() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn policies_and_origins_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/atk"),
            ("NEGATIVE_STOCK_POLICY", "Reject"),
            ("APPROVAL_POLICY", "role_limit"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:5173, https://aset.example.id"),
        ]))
        .unwrap();
        assert_eq!(config.negative_stock_policy, NegativeStockPolicy::Reject);
        assert_eq!(config.approval_policy, ApprovalPolicyKind::RoleLimit);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:5173".to_string(), "https://aset.example.id".to_string()]
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_policy = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/atk"),
            ("NEGATIVE_STOCK_POLICY", "clamp"),
        ]));
        assert!(bad_policy.is_err());

        let bad_number = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/atk"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]));
        assert!(bad_number.is_err());
    }
}
