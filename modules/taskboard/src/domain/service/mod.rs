//! Domain services. They depend only on the ports in `domain::repo`,
//! `domain::uniqueness` and `domain::ports`, never on infra types.

mod projects;
mod tasks;
mod users;

pub use projects::ProjectService;
pub use tasks::TaskService;
pub use users::UserService;

use std::sync::Arc;

use crate::domain::error::DomainError;
use crate::domain::repo::{
    ConstraintViolation, ProjectsRepository, TasksRepository, UsersRepository,
};
use crate::domain::uniqueness::{UniquenessStore, UniquenessValidator};
use crate::domain::webhook::EventDispatcher;

/// Paging limits applied by the services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// Every service of the module, wired to the same ports.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub projects: ProjectService,
    pub tasks: TaskService,
    pub events: EventDispatcher,
    pub config: ServiceConfig,
}

impl Services {
    pub fn new(
        users_repo: Arc<dyn UsersRepository>,
        projects_repo: Arc<dyn ProjectsRepository>,
        tasks_repo: Arc<dyn TasksRepository>,
        uniqueness: Arc<dyn UniquenessStore>,
        events: EventDispatcher,
        config: ServiceConfig,
    ) -> Self {
        let validator = UniquenessValidator::new(uniqueness);
        Self {
            users: UserService::new(
                users_repo.clone(),
                projects_repo.clone(),
                validator.clone(),
            ),
            projects: ProjectService::new(
                projects_repo.clone(),
                users_repo,
                tasks_repo.clone(),
                validator.clone(),
            ),
            tasks: TaskService::new(tasks_repo, projects_repo, validator),
            events,
            config,
        }
    }
}

/// Translate a repository error, letting the caller decide what a storage
/// constraint violation means for the operation at hand.
pub(crate) fn storage_error(
    e: anyhow::Error,
    on_violation: impl FnOnce(ConstraintViolation) -> DomainError,
) -> DomainError {
    match e.downcast_ref::<ConstraintViolation>() {
        Some(v) => on_violation(*v),
        None => DomainError::database(format!("{e:#}")),
    }
}

pub(crate) fn db_error(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}
