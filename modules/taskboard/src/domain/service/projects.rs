use std::sync::Arc;

use modkit::{Page, PageRequest};
use tracing::{debug, info, instrument};

use super::{db_error, storage_error};
use crate::contract::model::{NewProject, Project, ProjectUpdate};
use crate::domain::error::DomainError;
use crate::domain::repo::{
    ConstraintViolation, ProjectsRepository, TasksRepository, UsersRepository,
};
use crate::domain::uniqueness::{Scope, UniquenessValidator};

/// Project management. A project's owner must exist and its name is unique
/// (case-insensitively) among that owner's projects.
#[derive(Clone)]
pub struct ProjectService {
    repo: Arc<dyn ProjectsRepository>,
    users: Arc<dyn UsersRepository>,
    tasks: Arc<dyn TasksRepository>,
    uniqueness: UniquenessValidator,
}

impl ProjectService {
    pub fn new(
        repo: Arc<dyn ProjectsRepository>,
        users: Arc<dyn UsersRepository>,
        tasks: Arc<dyn TasksRepository>,
        uniqueness: UniquenessValidator,
    ) -> Self {
        Self {
            repo,
            users,
            tasks,
            uniqueness,
        }
    }

    async fn ensure_owner_exists(&self, owner_id: i64) -> Result<(), DomainError> {
        self.users
            .find_by_id(owner_id)
            .await
            .map_err(db_error)?
            .map(|_| ())
            .ok_or_else(|| DomainError::owner_not_found(owner_id))
    }

    fn write_error(e: anyhow::Error, owner_id: i64, name: String) -> DomainError {
        storage_error(e, |v| match v {
            ConstraintViolation::Unique => DomainError::project_name_conflict(owner_id, name),
            ConstraintViolation::ForeignKey => DomainError::owner_not_found(owner_id),
        })
    }

    #[instrument(
        name = "taskboard.service.projects.create",
        skip(self),
        fields(owner_id = new_project.owner_id, name = %new_project.name)
    )]
    pub async fn create_project(&self, new_project: NewProject) -> Result<Project, DomainError> {
        info!("Creating new project");

        let owner_id = new_project.owner_id;
        self.ensure_owner_exists(owner_id).await?;
        self.uniqueness
            .ensure_unique(Scope::ProjectName { owner_id }, &new_project.name, None)
            .await?;

        let name = new_project.name.clone();
        let project = self
            .repo
            .insert(new_project)
            .await
            .map_err(|e| Self::write_error(e, owner_id, name))?;

        info!(project_id = project.id, "Successfully created project");
        Ok(project)
    }

    #[instrument(name = "taskboard.service.projects.get", skip(self), fields(project_id = id))]
    pub async fn get_project(&self, id: i64) -> Result<Project, DomainError> {
        debug!("Getting project by id");
        self.repo
            .find_by_id(id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| DomainError::project_not_found(id))
    }

    #[instrument(name = "taskboard.service.projects.list", skip(self))]
    pub async fn list_projects(&self, page: PageRequest) -> Result<Page<Project>, DomainError> {
        let result = self.repo.list_page(page).await.map_err(db_error)?;
        debug!(count = result.content.len(), total = result.total_elements, "Listed projects");
        Ok(result)
    }

    #[instrument(
        name = "taskboard.service.projects.update",
        skip(self),
        fields(project_id = id, owner_id = update.owner_id)
    )]
    pub async fn update_project(
        &self,
        id: i64,
        update: ProjectUpdate,
    ) -> Result<Project, DomainError> {
        info!("Updating project");

        let exists = self.repo.exists(id).await.map_err(db_error)?;
        if !exists {
            return Err(DomainError::project_not_found(id));
        }

        let owner_id = update.owner_id;
        self.ensure_owner_exists(owner_id).await?;
        self.uniqueness
            .ensure_unique(Scope::ProjectName { owner_id }, &update.name, Some(id))
            .await?;

        let name = update.name.clone();
        let project = self
            .repo
            .update(id, update)
            .await
            .map_err(|e| Self::write_error(e, owner_id, name))?
            .ok_or_else(|| DomainError::project_not_found(id))?;

        info!("Successfully updated project");
        Ok(project)
    }

    /// Refuses to delete a project that still has tasks.
    #[instrument(name = "taskboard.service.projects.delete", skip(self), fields(project_id = id))]
    pub async fn delete_project(&self, id: i64) -> Result<(), DomainError> {
        info!("Deleting project");

        let exists = self.repo.exists(id).await.map_err(db_error)?;
        if !exists {
            return Err(DomainError::project_not_found(id));
        }

        let tasks = self.tasks.count_by_project(id).await.map_err(db_error)?;
        if tasks > 0 {
            return Err(DomainError::project_has_tasks(id));
        }

        let deleted = self.repo.delete(id).await.map_err(|e| {
            storage_error(e, |v| match v {
                ConstraintViolation::ForeignKey => DomainError::project_has_tasks(id),
                ConstraintViolation::Unique => {
                    DomainError::database("unexpected unique violation on project delete")
                }
            })
        })?;
        if !deleted {
            return Err(DomainError::project_not_found(id));
        }

        info!("Successfully deleted project");
        Ok(())
    }
}
