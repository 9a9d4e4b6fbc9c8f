use std::sync::Arc;

use modkit::{Page, PageRequest};
use tracing::{debug, info, instrument};

use super::{db_error, storage_error};
use crate::contract::model::{NewTask, Task, TaskDraft, TaskFilter, TaskUpdate};
use crate::domain::error::DomainError;
use crate::domain::filter::TaskPredicate;
use crate::domain::repo::{ConstraintViolation, ProjectsRepository, TaskFields, TasksRepository};
use crate::domain::uniqueness::{Scope, UniquenessValidator};

/// Task management and filtered listing. Titles are unique
/// (case-insensitively) within a project.
#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TasksRepository>,
    projects: Arc<dyn ProjectsRepository>,
    uniqueness: UniquenessValidator,
}

impl TaskService {
    pub fn new(
        repo: Arc<dyn TasksRepository>,
        projects: Arc<dyn ProjectsRepository>,
        uniqueness: UniquenessValidator,
    ) -> Self {
        Self {
            repo,
            projects,
            uniqueness,
        }
    }

    async fn ensure_project_exists(&self, project_id: i64) -> Result<(), DomainError> {
        if self.projects.exists(project_id).await.map_err(db_error)? {
            Ok(())
        } else {
            Err(DomainError::project_not_found(project_id))
        }
    }

    fn write_error(e: anyhow::Error, project_id: i64, title: String) -> DomainError {
        storage_error(e, |v| match v {
            ConstraintViolation::Unique => DomainError::task_title_conflict(project_id, title),
            ConstraintViolation::ForeignKey => DomainError::project_not_found(project_id),
        })
    }

    #[instrument(
        name = "taskboard.service.tasks.create",
        skip(self),
        fields(project_id = new_task.project_id, title = %new_task.title)
    )]
    pub async fn create_task(&self, new_task: NewTask) -> Result<Task, DomainError> {
        info!("Creating new task");

        let project_id = new_task.project_id;
        self.ensure_project_exists(project_id).await?;
        self.uniqueness
            .ensure_unique(Scope::TaskTitle { project_id }, &new_task.title, None)
            .await?;

        let fields = TaskFields {
            title: new_task.title,
            description: new_task.description,
            status: new_task.status.unwrap_or_default(),
            priority: new_task.priority.unwrap_or_default(),
            due_date: new_task.due_date,
            project_id,
        };
        let title = fields.title.clone();
        let task = self
            .repo
            .insert(fields)
            .await
            .map_err(|e| Self::write_error(e, project_id, title))?;

        info!(task_id = task.id, "Successfully created task");
        Ok(task)
    }

    /// Project-scoped creation; the project id comes from the caller, not the draft.
    #[instrument(
        name = "taskboard.service.tasks.create_for_project",
        skip(self, draft),
        fields(project_id = project_id)
    )]
    pub async fn create_task_for_project(
        &self,
        project_id: i64,
        draft: TaskDraft,
    ) -> Result<Task, DomainError> {
        self.create_task(draft.for_project(project_id)).await
    }

    #[instrument(name = "taskboard.service.tasks.get", skip(self), fields(task_id = id))]
    pub async fn get_task(&self, id: i64) -> Result<Task, DomainError> {
        debug!("Getting task by id");
        self.repo
            .find_by_id(id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| DomainError::task_not_found(id))
    }

    #[instrument(name = "taskboard.service.tasks.list", skip(self))]
    pub async fn list_tasks(
        &self,
        page: PageRequest,
        filter: TaskFilter,
    ) -> Result<Page<Task>, DomainError> {
        let predicate = TaskPredicate::from_filter(&filter);
        debug!(clauses = predicate.clauses().len(), "Listing tasks");
        let result = self
            .repo
            .list_page(page, &predicate)
            .await
            .map_err(db_error)?;
        debug!(count = result.content.len(), total = result.total_elements, "Listed tasks");
        Ok(result)
    }

    #[instrument(
        name = "taskboard.service.tasks.update",
        skip(self),
        fields(task_id = id, project_id = update.project_id)
    )]
    pub async fn update_task(&self, id: i64, update: TaskUpdate) -> Result<Task, DomainError> {
        info!("Updating task");

        self.get_task(id).await?;

        let project_id = update.project_id;
        self.ensure_project_exists(project_id).await?;
        self.uniqueness
            .ensure_unique(Scope::TaskTitle { project_id }, &update.title, Some(id))
            .await?;

        let title = update.title.clone();
        let task = self
            .repo
            .update(id, TaskFields::from(update))
            .await
            .map_err(|e| Self::write_error(e, project_id, title))?
            .ok_or_else(|| DomainError::task_not_found(id))?;

        info!("Successfully updated task");
        Ok(task)
    }

    #[instrument(name = "taskboard.service.tasks.delete", skip(self), fields(task_id = id))]
    pub async fn delete_task(&self, id: i64) -> Result<(), DomainError> {
        info!("Deleting task");

        let deleted = self.repo.delete(id).await.map_err(db_error)?;
        if !deleted {
            return Err(DomainError::task_not_found(id));
        }

        info!("Successfully deleted task");
        Ok(())
    }
}
