use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::error::DomainError;

/// Where a natural key must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// User email, across all users.
    Email,
    /// Project name within one owner.
    ProjectName { owner_id: i64 },
    /// Task title within one project.
    TaskTitle { project_id: i64 },
}

impl Scope {
    fn conflict(&self, value: &str) -> DomainError {
        match *self {
            Scope::Email => DomainError::email_already_exists(value),
            Scope::ProjectName { owner_id } => DomainError::project_name_conflict(owner_id, value),
            Scope::TaskTitle { project_id } => DomainError::task_title_conflict(project_id, value),
        }
    }
}

/// Comparison key for case-insensitive uniqueness.
pub fn normalize_key(value: &str) -> String {
    value.to_lowercase()
}

/// Existence lookup by normalized natural key.
#[async_trait]
pub trait UniquenessStore: Send + Sync {
    /// True if a record other than `exclude_id` already holds `key` in `scope`.
    async fn key_taken(
        &self,
        scope: Scope,
        key: &str,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<bool>;
}

/// Fast-path uniqueness check run before writes. The storage unique indexes
/// stay authoritative under concurrent writers.
#[derive(Clone)]
pub struct UniquenessValidator {
    store: Arc<dyn UniquenessStore>,
}

impl UniquenessValidator {
    pub fn new(store: Arc<dyn UniquenessStore>) -> Self {
        Self { store }
    }

    pub async fn ensure_unique(
        &self,
        scope: Scope,
        value: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), DomainError> {
        let key = normalize_key(value);
        let taken = self
            .store
            .key_taken(scope, &key, exclude_id)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;
        if taken {
            debug!(?scope, "uniqueness check rejected value");
            return Err(scope.conflict(value));
        }
        Ok(())
    }
}
