// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, str::FromStr, sync::Arc, time::Duration};

use crate::{
    db::{
        AdjustmentRepository, DirectoryRepository, DispatchRepository, FinanceRepository,
        InventoryRepository, ProductionRepository, SalesRepository, SettingsRepository,
        UserRepository,
    },
    services::{
        adjustment_service::AdjustmentService, auth::AuthService,
        directory_service::DirectoryService, dispatch_service::DispatchService,
        document_service::DocumentService, finance_service::FinanceService,
        identity_service::IdentityService, inventory_service::InventoryService,
        production_service::ProductionService, sales_service::SalesService,
        settings_service::SettingsService,
    },
};

/// Configuración leída del entorno (.env incluido).
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub identity_api_url: String,
    pub identity_api_token: Option<String>,
    pub identity_api_timeout: Duration,
    pub fonts_dir: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub cors_origin: Option<String>,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{} debe estar definida", name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ({}): {}", name, raw, e)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server_addr: optional("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_hours: parsed("JWT_EXPIRATION_HOURS", 12)?,
            identity_api_url: optional("IDENTITY_API_URL")
                .unwrap_or_else(|| "https://api.apis.net.pe/v2".to_string()),
            identity_api_token: optional("IDENTITY_API_TOKEN"),
            identity_api_timeout: Duration::from_secs(parsed("IDENTITY_API_TIMEOUT_SECS", 8)?),
            fonts_dir: optional("FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
            cors_origin: optional("CORS_ORIGIN"),
        })
    }
}

// El estado compartido que será accesible en toda la aplicación
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,

    pub auth_service: AuthService,
    pub directory_service: DirectoryService,
    pub identity_service: IdentityService,
    pub inventory_service: InventoryService,
    pub adjustment_service: AdjustmentService,
    pub production_service: ProductionService,
    pub sales_service: SalesService,
    pub dispatch_service: DispatchService,
    pub finance_service: FinanceService,
    pub settings_service: SettingsService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falla al conectar con la base de datos")?;

        tracing::info!("✅ Conexión con la base de datos establecida");

        Self::with_pool(config, db_pool)
    }

    /// Monta el grafo de dependencias sobre un pool ya creado.
    pub fn with_pool(config: Config, db_pool: PgPool) -> anyhow::Result<Self> {
        let user_repo = UserRepository::new(db_pool.clone());
        let directory_repo = DirectoryRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let adjustment_repo = AdjustmentRepository::new(db_pool.clone());
        let production_repo = ProductionRepository::new(db_pool.clone());
        let sales_repo = SalesRepository::new(db_pool.clone());
        let dispatch_repo = DispatchRepository::new(db_pool.clone());
        let finance_repo = FinanceRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo,
            db_pool.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
        );
        let identity_service = IdentityService::new(
            &config.identity_api_url,
            config.identity_api_token.clone(),
            config.identity_api_timeout,
        )?;
        let directory_service = DirectoryService::new(directory_repo.clone(), db_pool.clone());
        let inventory_service = InventoryService::new(inventory_repo, db_pool.clone());
        let adjustment_service =
            AdjustmentService::new(adjustment_repo, inventory_service.clone(), db_pool.clone());
        let production_service =
            ProductionService::new(production_repo, inventory_service.clone(), db_pool.clone());
        let sales_service = SalesService::new(
            sales_repo.clone(),
            directory_repo.clone(),
            settings_repo.clone(),
            inventory_service.clone(),
            db_pool.clone(),
        );
        let dispatch_service = DispatchService::new(
            dispatch_repo,
            sales_repo.clone(),
            directory_repo.clone(),
            settings_repo.clone(),
            inventory_service.clone(),
            db_pool.clone(),
        );
        let finance_service =
            FinanceService::new(finance_repo, sales_repo, directory_repo.clone(), db_pool.clone());
        let settings_service = SettingsService::new(settings_repo.clone(), db_pool.clone());
        let document_service = DocumentService::new(
            sales_service.clone(),
            dispatch_service.clone(),
            finance_service.clone(),
            directory_repo,
            settings_repo,
            db_pool.clone(),
            config.fonts_dir.clone(),
        );

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            directory_service,
            identity_service,
            inventory_service,
            adjustment_service,
            production_service,
            sales_service,
            dispatch_service,
            finance_service,
            settings_service,
            document_service,
        })
    }
}
