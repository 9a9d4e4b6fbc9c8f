use async_trait::async_trait;
use modkit::{Page, PageRequest};
use std::sync::Arc;

use crate::contract::{
    client::TaskboardApi,
    error::TaskboardError,
    model::{
        EventRequest, NewProject, NewTask, NewUser, Project, ProjectUpdate, Task, TaskDraft,
        TaskFilter, TaskUpdate, User, UserUpdate,
    },
};
use crate::domain::{error::DomainError, service::Services};

/// Local implementation of the TaskboardApi trait that delegates to the domain services
pub struct TaskboardLocalClient {
    services: Arc<Services>,
}

impl TaskboardLocalClient {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl TaskboardApi for TaskboardLocalClient {
    async fn create_user(&self, new_user: NewUser) -> Result<User, TaskboardError> {
        Ok(self.services.users.create_user(new_user).await?)
    }

    async fn get_user(&self, id: i64) -> Result<User, TaskboardError> {
        Ok(self.services.users.get_user(id).await?)
    }

    async fn list_users(&self, page: PageRequest) -> Result<Page<User>, TaskboardError> {
        Ok(self.services.users.list_users(page).await?)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<User, TaskboardError> {
        Ok(self.services.users.update_user(id, update).await?)
    }

    async fn delete_user(&self, id: i64) -> Result<(), TaskboardError> {
        Ok(self.services.users.delete_user(id).await?)
    }

    async fn create_project(&self, new_project: NewProject) -> Result<Project, TaskboardError> {
        Ok(self.services.projects.create_project(new_project).await?)
    }

    async fn get_project(&self, id: i64) -> Result<Project, TaskboardError> {
        Ok(self.services.projects.get_project(id).await?)
    }

    async fn list_projects(&self, page: PageRequest) -> Result<Page<Project>, TaskboardError> {
        Ok(self.services.projects.list_projects(page).await?)
    }

    async fn update_project(
        &self,
        id: i64,
        update: ProjectUpdate,
    ) -> Result<Project, TaskboardError> {
        Ok(self.services.projects.update_project(id, update).await?)
    }

    async fn delete_project(&self, id: i64) -> Result<(), TaskboardError> {
        Ok(self.services.projects.delete_project(id).await?)
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, TaskboardError> {
        Ok(self.services.tasks.create_task(new_task).await?)
    }

    async fn create_task_for_project(
        &self,
        project_id: i64,
        draft: TaskDraft,
    ) -> Result<Task, TaskboardError> {
        Ok(self
            .services
            .tasks
            .create_task_for_project(project_id, draft)
            .await?)
    }

    async fn get_task(&self, id: i64) -> Result<Task, TaskboardError> {
        Ok(self.services.tasks.get_task(id).await?)
    }

    async fn list_tasks(
        &self,
        page: PageRequest,
        filter: TaskFilter,
    ) -> Result<Page<Task>, TaskboardError> {
        Ok(self.services.tasks.list_tasks(page, filter).await?)
    }

    async fn update_task(&self, id: i64, update: TaskUpdate) -> Result<Task, TaskboardError> {
        Ok(self.services.tasks.update_task(id, update).await?)
    }

    async fn delete_task(&self, id: i64) -> Result<(), TaskboardError> {
        Ok(self.services.tasks.delete_task(id).await?)
    }

    async fn send_event(&self, request: EventRequest) -> Result<(), TaskboardError> {
        Ok(self.services.events.send(request).await?)
    }
}

/// Map domain errors to the public contract error
impl From<DomainError> for TaskboardError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UserNotFound { id } => TaskboardError::not_found("User", id),
            DomainError::OwnerNotFound { id } => TaskboardError::not_found("Owner", id),
            DomainError::ProjectNotFound { id } => TaskboardError::not_found("Project", id),
            DomainError::TaskNotFound { id } => TaskboardError::not_found("Task", id),
            e @ (DomainError::EmailAlreadyExists { .. }
            | DomainError::ProjectNameConflict { .. }
            | DomainError::TaskTitleConflict { .. }
            | DomainError::UserHasProjects { .. }
            | DomainError::ProjectHasTasks { .. }) => TaskboardError::conflict(e.to_string()),
            DomainError::Validation { field, message } => {
                TaskboardError::validation(format!("{field}: {message}"))
            }
            DomainError::WebhookDeliveryFailed { cause } => {
                TaskboardError::upstream(format!("webhook delivery failed: {cause}"))
            }
            DomainError::Database { message } => {
                tracing::error!(%message, "database error hidden behind contract error");
                TaskboardError::internal()
            }
        }
    }
}
