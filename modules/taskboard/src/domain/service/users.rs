use std::sync::Arc;

use modkit::{Page, PageRequest};
use tracing::{debug, info, instrument};

use super::{db_error, storage_error};
use crate::contract::model::{NewUser, User, UserUpdate};
use crate::domain::error::DomainError;
use crate::domain::repo::{ConstraintViolation, ProjectsRepository, UsersRepository};
use crate::domain::uniqueness::{normalize_key, Scope, UniquenessValidator};

/// User management: CRUD with globally unique, case-insensitive emails.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UsersRepository>,
    projects: Arc<dyn ProjectsRepository>,
    uniqueness: UniquenessValidator,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UsersRepository>,
        projects: Arc<dyn ProjectsRepository>,
        uniqueness: UniquenessValidator,
    ) -> Self {
        Self {
            repo,
            projects,
            uniqueness,
        }
    }

    #[instrument(
        name = "taskboard.service.users.create",
        skip(self),
        fields(email = %new_user.email)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        self.uniqueness
            .ensure_unique(Scope::Email, &new_user.email, None)
            .await?;

        let email = new_user.email.clone();
        let user = self.repo.insert(new_user).await.map_err(|e| {
            storage_error(e, |v| match v {
                ConstraintViolation::Unique => DomainError::email_already_exists(email),
                ConstraintViolation::ForeignKey => {
                    DomainError::database("unexpected foreign key violation on user insert")
                }
            })
        })?;

        info!(user_id = user.id, "Successfully created user");
        Ok(user)
    }

    #[instrument(name = "taskboard.service.users.get", skip(self), fields(user_id = id))]
    pub async fn get_user(&self, id: i64) -> Result<User, DomainError> {
        debug!("Getting user by id");
        self.repo
            .find_by_id(id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    #[instrument(name = "taskboard.service.users.list", skip(self))]
    pub async fn list_users(&self, page: PageRequest) -> Result<Page<User>, DomainError> {
        let result = self.repo.list_page(page).await.map_err(db_error)?;
        debug!(count = result.content.len(), total = result.total_elements, "Listed users");
        Ok(result)
    }

    #[instrument(name = "taskboard.service.users.update", skip(self), fields(user_id = id))]
    pub async fn update_user(&self, id: i64, update: UserUpdate) -> Result<User, DomainError> {
        info!("Updating user");

        let current = self.get_user(id).await?;

        if normalize_key(&current.email) != normalize_key(&update.email) {
            self.uniqueness
                .ensure_unique(Scope::Email, &update.email, Some(id))
                .await?;
        }

        let email = update.email.clone();
        let updated = self
            .repo
            .update(id, update)
            .await
            .map_err(|e| {
                storage_error(e, |v| match v {
                    ConstraintViolation::Unique => DomainError::email_already_exists(email),
                    ConstraintViolation::ForeignKey => {
                        DomainError::database("unexpected foreign key violation on user update")
                    }
                })
            })?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        info!("Successfully updated user");
        Ok(updated)
    }

    /// Refuses to delete a user who still owns projects.
    #[instrument(name = "taskboard.service.users.delete", skip(self), fields(user_id = id))]
    pub async fn delete_user(&self, id: i64) -> Result<(), DomainError> {
        info!("Deleting user");

        self.get_user(id).await?;

        let owned = self.projects.count_by_owner(id).await.map_err(db_error)?;
        if owned > 0 {
            return Err(DomainError::user_has_projects(id));
        }

        let deleted = self.repo.delete(id).await.map_err(|e| {
            storage_error(e, |v| match v {
                ConstraintViolation::ForeignKey => DomainError::user_has_projects(id),
                ConstraintViolation::Unique => {
                    DomainError::database("unexpected unique violation on user delete")
                }
            })
        })?;
        if !deleted {
            return Err(DomainError::user_not_found(id));
        }

        info!("Successfully deleted user");
        Ok(())
    }
}
