use std::time::Duration;
use thiserror::Error;

/// Why a webhook dispatch did not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookFailure {
    #[error("no response within {after:?}")]
    Timeout { after: Duration },

    #[error("endpoint answered with HTTP {status}")]
    Rejected { status: u16 },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("invalid webhook destination: {message}")]
    InvalidDestination { message: String },
}

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("Owner not found: {id}")]
    OwnerNotFound { id: i64 },

    #[error("Project not found: {id}")]
    ProjectNotFound { id: i64 },

    #[error("Task not found: {id}")]
    TaskNotFound { id: i64 },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Owner {owner_id} already has a project named '{name}'")]
    ProjectNameConflict { owner_id: i64, name: String },

    #[error("Project {project_id} already has a task titled '{title}'")]
    TaskTitleConflict { project_id: i64, title: String },

    #[error("User {id} still owns projects")]
    UserHasProjects { id: i64 },

    #[error("Project {id} still has tasks")]
    ProjectHasTasks { id: i64 },

    #[error("Failed to send webhook event")]
    WebhookDeliveryFailed {
        #[source]
        cause: WebhookFailure,
    },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn user_not_found(id: i64) -> Self {
        Self::UserNotFound { id }
    }

    pub fn owner_not_found(id: i64) -> Self {
        Self::OwnerNotFound { id }
    }

    pub fn project_not_found(id: i64) -> Self {
        Self::ProjectNotFound { id }
    }

    pub fn task_not_found(id: i64) -> Self {
        Self::TaskNotFound { id }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn project_name_conflict(owner_id: i64, name: impl Into<String>) -> Self {
        Self::ProjectNameConflict {
            owner_id,
            name: name.into(),
        }
    }

    pub fn task_title_conflict(project_id: i64, title: impl Into<String>) -> Self {
        Self::TaskTitleConflict {
            project_id,
            title: title.into(),
        }
    }

    pub fn user_has_projects(id: i64) -> Self {
        Self::UserHasProjects { id }
    }

    pub fn project_has_tasks(id: i64) -> Self {
        Self::ProjectHasTasks { id }
    }

    pub fn webhook_delivery_failed(cause: WebhookFailure) -> Self {
        Self::WebhookDeliveryFailed { cause }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// True for every uniqueness or referential-block conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::EmailAlreadyExists { .. }
                | Self::ProjectNameConflict { .. }
                | Self::TaskTitleConflict { .. }
                | Self::UserHasProjects { .. }
                | Self::ProjectHasTasks { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound { .. }
                | Self::OwnerNotFound { .. }
                | Self::ProjectNotFound { .. }
                | Self::TaskNotFound { .. }
        )
    }
}
