use anyhow::Context;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::domain::uniqueness::{Scope, UniquenessStore};
use crate::infra::storage::entity::{project, task, user};

/// Answers uniqueness questions against the `*_key` columns.
pub struct SeaOrmUniquenessStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUniquenessStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UniquenessStore for SeaOrmUniquenessStore<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn key_taken(
        &self,
        scope: Scope,
        key: &str,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<bool> {
        let count = match scope {
            Scope::Email => {
                let mut q = user::Entity::find().filter(user::Column::EmailKey.eq(key));
                if let Some(id) = exclude_id {
                    q = q.filter(user::Column::Id.ne(id));
                }
                q.count(&self.conn).await
            }
            Scope::ProjectName { owner_id } => {
                let mut q = project::Entity::find()
                    .filter(project::Column::OwnerId.eq(owner_id))
                    .filter(project::Column::NameKey.eq(key));
                if let Some(id) = exclude_id {
                    q = q.filter(project::Column::Id.ne(id));
                }
                q.count(&self.conn).await
            }
            Scope::TaskTitle { project_id } => {
                let mut q = task::Entity::find()
                    .filter(task::Column::ProjectId.eq(project_id))
                    .filter(task::Column::TitleKey.eq(key));
                if let Some(id) = exclude_id {
                    q = q.filter(task::Column::Id.ne(id));
                }
                q.count(&self.conn).await
            }
        }
        .with_context(|| format!("uniqueness lookup failed for {scope:?}"))?;
        Ok(count > 0)
    }
}
