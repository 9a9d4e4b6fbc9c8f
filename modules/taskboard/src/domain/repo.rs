use async_trait::async_trait;
use chrono::NaiveDate;
use modkit::{Page, PageRequest};
use thiserror::Error;

use crate::contract::model::{
    NewProject, NewUser, Project, ProjectUpdate, Task, TaskPriority, TaskStatus, TaskUpdate, User,
    UserUpdate,
};
use crate::domain::filter::TaskPredicate;

/// Storage-level integrity failure surfaced by a repository write.
///
/// Repositories return it inside `anyhow::Error` so the service can tell a
/// lost uniqueness race (or a blocked delete) apart from an outage.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    #[error("unique constraint violated")]
    Unique,
    #[error("foreign key constraint violated")]
    ForeignKey,
}

/// Fully resolved task columns; defaults are applied before this reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub project_id: i64,
}

impl From<TaskUpdate> for TaskFields {
    fn from(u: TaskUpdate) -> Self {
        Self {
            title: u.title,
            description: u.description,
            status: u.status,
            priority: u.priority,
            due_date: u.due_date,
            project_id: u.project_id,
        }
    }
}

/// Persistence operations the user service needs.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    /// Insert and return the stored row (with assigned id and timestamp).
    async fn insert(&self, new_user: NewUser) -> anyhow::Result<User>;
    /// Replace name/email. Returns `None` if the row vanished.
    async fn update(&self, id: i64, update: UserUpdate) -> anyhow::Result<Option<User>>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
    /// Page ordered by id descending.
    async fn list_page(&self, page: PageRequest) -> anyhow::Result<Page<User>>;
}

#[async_trait]
pub trait ProjectsRepository: Send + Sync {
    /// Load a project with its owner snapshot.
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Project>>;
    async fn exists(&self, id: i64) -> anyhow::Result<bool>;
    async fn insert(&self, new_project: NewProject) -> anyhow::Result<Project>;
    async fn update(&self, id: i64, update: ProjectUpdate) -> anyhow::Result<Option<Project>>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
    async fn count_by_owner(&self, owner_id: i64) -> anyhow::Result<u64>;
    async fn list_page(&self, page: PageRequest) -> anyhow::Result<Page<Project>>;
}

#[async_trait]
pub trait TasksRepository: Send + Sync {
    /// Load a task with its project and the project's owner.
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Task>>;
    async fn insert(&self, fields: TaskFields) -> anyhow::Result<Task>;
    async fn update(&self, id: i64, fields: TaskFields) -> anyhow::Result<Option<Task>>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
    async fn count_by_project(&self, project_id: i64) -> anyhow::Result<u64>;
    /// Page of tasks matching `predicate`, ordered by id descending.
    async fn list_page(
        &self,
        page: PageRequest,
        predicate: &TaskPredicate,
    ) -> anyhow::Result<Page<Task>>;
}
