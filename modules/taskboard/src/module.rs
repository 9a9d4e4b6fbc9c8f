use std::sync::Arc;

use anyhow::Context;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};
use url::Url;

use crate::api::rest::routes;
use crate::config::TaskboardConfig;
use crate::contract::client::TaskboardApi;
use crate::domain::ports::WebhookPort;
use crate::domain::service::{ServiceConfig, Services};
use crate::domain::webhook::{DispatcherConfig, EventDispatcher};
use crate::gateways::local::TaskboardLocalClient;
use crate::infra::storage::{
    SeaOrmProjectsRepository, SeaOrmTasksRepository, SeaOrmUniquenessStore, SeaOrmUsersRepository,
};
use crate::infra::webhook::HttpWebhookClient;

/// Taskboard module: owns the services once `init` has run and hands them to
/// the REST layer and to in-process clients.
#[derive(Default)]
pub struct Taskboard {
    // Keep the services behind ArcSwap for cheap read-mostly access.
    services: arc_swap::ArcSwapOption<Services>,
}

impl Clone for Taskboard {
    fn clone(&self) -> Self {
        Self {
            services: arc_swap::ArcSwapOption::new(self.services.load_full()),
        }
    }
}

impl Taskboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or upgrade the schema.
    pub async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running taskboard database migrations");
        crate::infra::storage::migrations::Migrator::up(db, None).await?;
        info!("Taskboard database migrations completed successfully");
        Ok(())
    }

    /// Wire repositories and the HTTP webhook adapter described by `cfg`.
    pub async fn init(&self, db: DatabaseConnection, cfg: TaskboardConfig) -> anyhow::Result<()> {
        let destination = Url::parse(&cfg.webhook.url)
            .with_context(|| format!("invalid webhook url '{}'", cfg.webhook.url))?;
        let webhook = HttpWebhookClient::with_timeout(destination, cfg.webhook.timeout())
            .context("failed to build webhook HTTP client")?;
        self.init_with_webhook(db, cfg, Arc::new(webhook)).await
    }

    /// Same as [`Taskboard::init`] with a caller-supplied webhook adapter.
    pub async fn init_with_webhook(
        &self,
        db: DatabaseConnection,
        cfg: TaskboardConfig,
        webhook: Arc<dyn WebhookPort>,
    ) -> anyhow::Result<()> {
        info!("Initializing taskboard module");
        debug!(
            "Loaded taskboard config: default_page_size={}, max_page_size={}, webhook_url={}",
            cfg.default_page_size, cfg.max_page_size, cfg.webhook.url
        );
        if cfg.default_page_size == 0 || cfg.default_page_size > cfg.max_page_size {
            anyhow::bail!(
                "default_page_size must be in 1..={}, got {}",
                cfg.max_page_size,
                cfg.default_page_size
            );
        }

        let events = EventDispatcher::new(
            webhook,
            DispatcherConfig {
                timeout: cfg.webhook.timeout(),
                default_source: cfg.webhook.default_source.clone(),
                default_type: cfg.webhook.default_type.clone(),
            },
        );
        let services = Services::new(
            Arc::new(SeaOrmUsersRepository::new(db.clone())),
            Arc::new(SeaOrmProjectsRepository::new(db.clone())),
            Arc::new(SeaOrmTasksRepository::new(db.clone())),
            Arc::new(SeaOrmUniquenessStore::new(db)),
            events,
            ServiceConfig {
                default_page_size: cfg.default_page_size,
                max_page_size: cfg.max_page_size,
            },
        );

        self.services.store(Some(Arc::new(services)));
        info!("Taskboard module initialized");
        Ok(())
    }

    fn services(&self) -> anyhow::Result<Arc<Services>> {
        self.services
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Taskboard services not initialized"))
    }

    pub fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering taskboard REST routes");
        let router = routes::register_routes(router, self.services()?)?;
        info!("Taskboard REST routes registered successfully");
        Ok(router)
    }

    /// In-process client over the same services the REST layer uses.
    pub fn client(&self) -> anyhow::Result<Arc<dyn TaskboardApi>> {
        Ok(Arc::new(TaskboardLocalClient::new(self.services()?)))
    }
}
