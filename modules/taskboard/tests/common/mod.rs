#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use taskboard::config::TaskboardConfig;
use taskboard::contract::model::{NewProject, NewTask, NewUser, Project, Task, User};
use taskboard::domain::error::WebhookFailure;
use taskboard::domain::events::WebhookEvent;
use taskboard::domain::ports::WebhookPort;
use taskboard::domain::service::{ServiceConfig, Services};
use taskboard::domain::webhook::{DispatcherConfig, EventDispatcher};
use taskboard::infra::storage::{
    migrations::Migrator, SeaOrmProjectsRepository, SeaOrmTasksRepository, SeaOrmUniquenessStore,
    SeaOrmUsersRepository,
};
use taskboard::Taskboard;

/// Webhook stand-in that records events and answers with a fixed outcome.
#[derive(Default)]
pub struct StubWebhook {
    pub seen: Mutex<Vec<WebhookEvent>>,
    pub fail_with: Option<WebhookFailure>,
}

impl StubWebhook {
    pub fn failing(failure: WebhookFailure) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            fail_with: Some(failure),
        }
    }
}

#[async_trait]
impl WebhookPort for StubWebhook {
    async fn deliver(&self, event: &WebhookEvent) -> Result<(), WebhookFailure> {
        self.seen.lock().unwrap().push(event.clone());
        match &self.fail_with {
            Some(f) => Err(f.clone()),
            None => Ok(()),
        }
    }
}

/// Fresh in-memory SQLite database with the schema applied.
pub async fn test_db() -> DatabaseConnection {
    use sea_orm_migration::MigratorTrait;

    let mut opts = ConnectOptions::new("sqlite::memory:");
    // One connection, otherwise every pooled connection sees its own empty database.
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn test_services_with(webhook: Arc<dyn WebhookPort>) -> Arc<Services> {
    let db = test_db().await;
    Arc::new(Services::new(
        Arc::new(SeaOrmUsersRepository::new(db.clone())),
        Arc::new(SeaOrmProjectsRepository::new(db.clone())),
        Arc::new(SeaOrmTasksRepository::new(db.clone())),
        Arc::new(SeaOrmUniquenessStore::new(db)),
        EventDispatcher::new(webhook, DispatcherConfig::default()),
        ServiceConfig::default(),
    ))
}

pub async fn test_services() -> Arc<Services> {
    test_services_with(Arc::new(StubWebhook::default())).await
}

/// Module initialized the way the server does it, minus the HTTP webhook.
pub async fn test_module(webhook: Arc<dyn WebhookPort>) -> Taskboard {
    let db = test_db().await;
    let module = Taskboard::new();
    // Migrations are idempotent; running them again through the module is fine.
    module.migrate(&db).await.expect("migrate");
    module
        .init_with_webhook(db, TaskboardConfig::default(), webhook)
        .await
        .expect("init");
    module
}

pub async fn test_router_with(webhook: Arc<dyn WebhookPort>) -> Router {
    test_module(webhook)
        .await
        .register_rest(Router::new())
        .expect("Failed to register routes")
}

pub async fn test_router() -> Router {
    test_router_with(Arc::new(StubWebhook::default())).await
}

pub async fn seed_user(svc: &Services, name: &str, email: &str) -> User {
    svc.users
        .create_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
        })
        .await
        .expect("seed user")
}

pub async fn seed_project(svc: &Services, owner_id: i64, name: &str) -> Project {
    svc.projects
        .create_project(NewProject {
            name: name.to_string(),
            description: None,
            owner_id,
        })
        .await
        .expect("seed project")
}

pub fn new_task(project_id: i64, title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: None,
        status: None,
        priority: None,
        due_date: None,
        project_id,
    }
}

pub async fn seed_task(svc: &Services, project_id: i64, title: &str) -> Task {
    svc.tasks
        .create_task(new_task(project_id, title))
        .await
        .expect("seed task")
}
