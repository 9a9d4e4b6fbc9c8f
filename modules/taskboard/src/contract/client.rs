use async_trait::async_trait;
use modkit::{Page, PageRequest};

use crate::contract::error::TaskboardError;
use crate::contract::model::{
    EventRequest, NewProject, NewTask, NewUser, Project, ProjectUpdate, Task, TaskDraft,
    TaskFilter, TaskUpdate, User, UserUpdate,
};

/// Public API of the taskboard module for in-process consumers
#[async_trait]
pub trait TaskboardApi: Send + Sync {
    async fn create_user(&self, new_user: NewUser) -> Result<User, TaskboardError>;
    async fn get_user(&self, id: i64) -> Result<User, TaskboardError>;
    async fn list_users(&self, page: PageRequest) -> Result<Page<User>, TaskboardError>;
    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<User, TaskboardError>;
    async fn delete_user(&self, id: i64) -> Result<(), TaskboardError>;

    async fn create_project(&self, new_project: NewProject) -> Result<Project, TaskboardError>;
    async fn get_project(&self, id: i64) -> Result<Project, TaskboardError>;
    async fn list_projects(&self, page: PageRequest) -> Result<Page<Project>, TaskboardError>;
    async fn update_project(
        &self,
        id: i64,
        update: ProjectUpdate,
    ) -> Result<Project, TaskboardError>;
    async fn delete_project(&self, id: i64) -> Result<(), TaskboardError>;

    async fn create_task(&self, new_task: NewTask) -> Result<Task, TaskboardError>;
    /// Create a task inside `project_id`; same rules as `create_task`.
    async fn create_task_for_project(
        &self,
        project_id: i64,
        draft: TaskDraft,
    ) -> Result<Task, TaskboardError>;
    async fn get_task(&self, id: i64) -> Result<Task, TaskboardError>;
    async fn list_tasks(
        &self,
        page: PageRequest,
        filter: TaskFilter,
    ) -> Result<Page<Task>, TaskboardError>;
    async fn update_task(&self, id: i64, update: TaskUpdate) -> Result<Task, TaskboardError>;
    async fn delete_task(&self, id: i64) -> Result<(), TaskboardError>;

    /// One-shot webhook dispatch; no retry.
    async fn send_event(&self, request: EventRequest) -> Result<(), TaskboardError>;
}
