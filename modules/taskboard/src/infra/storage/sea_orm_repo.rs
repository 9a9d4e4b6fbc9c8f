//! SeaORM-backed repository implementations for the domain ports.
//!
//! Each struct is generic over `C: ConnectionTrait`, so it can be built with a
//! `DatabaseConnection` or a transaction. Writes re-read the stored row so the
//! returned model carries the same denormalized shape as a plain read.

use std::collections::HashMap;

use anyhow::{anyhow, Context};
use chrono::Utc;
use modkit::{Page, PageRequest};
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};

use crate::contract::model::{NewProject, NewUser, Project, ProjectUpdate, Task, User, UserUpdate};
use crate::domain::filter::{Clause, TaskPredicate};
use crate::domain::repo::{
    ConstraintViolation, ProjectsRepository, TaskFields, TasksRepository, UsersRepository,
};
use crate::domain::uniqueness::normalize_key;
use crate::infra::storage::entity::{project, task, user};
use crate::infra::storage::mapper::{project_from_row, task_from_row};

/// Surface integrity violations as [`ConstraintViolation`] so the domain can
/// turn them into conflicts; everything else stays an opaque storage error.
fn write_failed(err: DbErr, what: &'static str) -> anyhow::Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            anyhow::Error::new(ConstraintViolation::Unique).context(what)
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            anyhow::Error::new(ConstraintViolation::ForeignKey).context(what)
        }
        // A RESTRICT action is reported as SQLITE_CONSTRAINT_TRIGGER (1811),
        // which `sql_err` does not classify.
        _ if is_foreign_key_failure(&err) => {
            anyhow::Error::new(ConstraintViolation::ForeignKey).context(what)
        }
        _ => anyhow::Error::new(err).context(what),
    }
}

fn is_foreign_key_failure(err: &DbErr) -> bool {
    err.to_string().contains("FOREIGN KEY constraint failed")
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let found = user::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find user failed")?;
        Ok(found.map(Into::into))
    }

    async fn insert(&self, new_user: NewUser) -> anyhow::Result<User> {
        let m = user::ActiveModel {
            id: NotSet,
            email_key: Set(normalize_key(&new_user.email)),
            name: Set(new_user.name),
            email: Set(new_user.email),
            created_at: Set(Utc::now()),
        };
        let stored = m
            .insert(&self.conn)
            .await
            .map_err(|e| write_failed(e, "insert user failed"))?;
        Ok(stored.into())
    }

    async fn update(&self, id: i64, update: UserUpdate) -> anyhow::Result<Option<User>> {
        let Some(existing) = user::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("load user for update failed")?
        else {
            return Ok(None);
        };

        let mut m: user::ActiveModel = existing.into();
        m.email_key = Set(normalize_key(&update.email));
        m.name = Set(update.name);
        m.email = Set(update.email);
        let stored = m
            .update(&self.conn)
            .await
            .map_err(|e| write_failed(e, "update user failed"))?;
        Ok(Some(stored.into()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = user::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(|e| write_failed(e, "delete user failed"))?;
        Ok(res.rows_affected > 0)
    }

    async fn list_page(&self, page: PageRequest) -> anyhow::Result<Page<User>> {
        let paginator = user::Entity::find()
            .order_by_desc(user::Column::Id)
            .paginate(&self.conn, page.size);
        let total = paginator.num_items().await.context("count users failed")?;
        let rows = paginator
            .fetch_page(page.page)
            .await
            .context("list users failed")?;
        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

fn join_owner(row: project::Model, owner: Option<user::Model>) -> anyhow::Result<Project> {
    let owner = owner.ok_or_else(|| anyhow!("project {} references a missing owner", row.id))?;
    Ok(project_from_row(row, owner))
}

async fn load_project<C: ConnectionTrait>(conn: &C, id: i64) -> anyhow::Result<Option<Project>> {
    let found = project::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(conn)
        .await
        .context("find project failed")?;
    found.map(|(row, owner)| join_owner(row, owner)).transpose()
}

async fn load_projects<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<i64>,
) -> anyhow::Result<HashMap<i64, Project>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = project::Entity::find()
        .filter(project::Column::Id.is_in(ids))
        .find_also_related(user::Entity)
        .all(conn)
        .await
        .context("load projects failed")?;
    rows.into_iter()
        .map(|(row, owner)| join_owner(row, owner).map(|p| (p.id, p)))
        .collect()
}

pub struct SeaOrmProjectsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmProjectsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> ProjectsRepository for SeaOrmProjectsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Project>> {
        load_project(&self.conn, id).await
    }

    async fn exists(&self, id: i64) -> anyhow::Result<bool> {
        let count = project::Entity::find_by_id(id)
            .count(&self.conn)
            .await
            .context("project exists check failed")?;
        Ok(count > 0)
    }

    async fn insert(&self, new_project: NewProject) -> anyhow::Result<Project> {
        let m = project::ActiveModel {
            id: NotSet,
            name_key: Set(normalize_key(&new_project.name)),
            name: Set(new_project.name),
            description: Set(new_project.description),
            owner_id: Set(new_project.owner_id),
            created_at: Set(Utc::now()),
        };
        let stored = m
            .insert(&self.conn)
            .await
            .map_err(|e| write_failed(e, "insert project failed"))?;
        load_project(&self.conn, stored.id)
            .await?
            .ok_or_else(|| anyhow!("project {} vanished after insert", stored.id))
    }

    async fn update(&self, id: i64, update: ProjectUpdate) -> anyhow::Result<Option<Project>> {
        let Some(existing) = project::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("load project for update failed")?
        else {
            return Ok(None);
        };

        let mut m: project::ActiveModel = existing.into();
        m.name_key = Set(normalize_key(&update.name));
        m.name = Set(update.name);
        m.description = Set(update.description);
        m.owner_id = Set(update.owner_id);
        m.update(&self.conn)
            .await
            .map_err(|e| write_failed(e, "update project failed"))?;
        load_project(&self.conn, id).await
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = project::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(|e| write_failed(e, "delete project failed"))?;
        Ok(res.rows_affected > 0)
    }

    async fn count_by_owner(&self, owner_id: i64) -> anyhow::Result<u64> {
        project::Entity::find()
            .filter(project::Column::OwnerId.eq(owner_id))
            .count(&self.conn)
            .await
            .context("count projects by owner failed")
    }

    async fn list_page(&self, page: PageRequest) -> anyhow::Result<Page<Project>> {
        let paginator = project::Entity::find()
            .find_also_related(user::Entity)
            .order_by_desc(project::Column::Id)
            .paginate(&self.conn, page.size);
        let total = paginator
            .num_items()
            .await
            .context("count projects failed")?;
        let rows = paginator
            .fetch_page(page.page)
            .await
            .context("list projects failed")?;
        let content = rows
            .into_iter()
            .map(|(row, owner)| join_owner(row, owner))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Page::new(content, page, total))
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn clause_expr(clause: &Clause) -> SimpleExpr {
    match clause {
        Clause::Status(s) => task::Column::Status.eq(s.as_str()),
        Clause::Priority(p) => task::Column::Priority.eq(p.as_str()),
        Clause::Project(id) => task::Column::ProjectId.eq(*id),
    }
}

/// Fold the predicate over `Condition::all()`, SeaORM's neutral AND.
pub fn predicate_condition(predicate: &TaskPredicate) -> Condition {
    predicate
        .clauses()
        .iter()
        .fold(Condition::all(), |cond, clause| cond.add(clause_expr(clause)))
}

pub struct SeaOrmTasksRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmTasksRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    async fn compose(&self, rows: Vec<task::Model>) -> anyhow::Result<Vec<Task>> {
        let mut ids: Vec<i64> = rows.iter().map(|r| r.project_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let projects = load_projects(&self.conn, ids).await?;

        rows.into_iter()
            .map(|row| {
                let project = projects
                    .get(&row.project_id)
                    .cloned()
                    .ok_or_else(|| anyhow!("task {} references a missing project", row.id))?;
                task_from_row(row, project)
            })
            .collect()
    }

    async fn load(&self, id: i64) -> anyhow::Result<Option<Task>> {
        let Some(row) = task::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find task failed")?
        else {
            return Ok(None);
        };
        Ok(self.compose(vec![row]).await?.pop())
    }
}

#[async_trait::async_trait]
impl<C> TasksRepository for SeaOrmTasksRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Task>> {
        self.load(id).await
    }

    async fn insert(&self, fields: TaskFields) -> anyhow::Result<Task> {
        let m = task::ActiveModel {
            id: NotSet,
            title_key: Set(normalize_key(&fields.title)),
            title: Set(fields.title),
            description: Set(fields.description),
            status: Set(fields.status.as_str().to_string()),
            priority: Set(fields.priority.as_str().to_string()),
            due_date: Set(fields.due_date),
            project_id: Set(fields.project_id),
            created_at: Set(Utc::now()),
        };
        let stored = m
            .insert(&self.conn)
            .await
            .map_err(|e| write_failed(e, "insert task failed"))?;
        self.load(stored.id)
            .await?
            .ok_or_else(|| anyhow!("task {} vanished after insert", stored.id))
    }

    async fn update(&self, id: i64, fields: TaskFields) -> anyhow::Result<Option<Task>> {
        let Some(existing) = task::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("load task for update failed")?
        else {
            return Ok(None);
        };

        let mut m: task::ActiveModel = existing.into();
        m.title_key = Set(normalize_key(&fields.title));
        m.title = Set(fields.title);
        m.description = Set(fields.description);
        m.status = Set(fields.status.as_str().to_string());
        m.priority = Set(fields.priority.as_str().to_string());
        m.due_date = Set(fields.due_date);
        m.project_id = Set(fields.project_id);
        m.update(&self.conn)
            .await
            .map_err(|e| write_failed(e, "update task failed"))?;
        self.load(id).await
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = task::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(|e| write_failed(e, "delete task failed"))?;
        Ok(res.rows_affected > 0)
    }

    async fn count_by_project(&self, project_id: i64) -> anyhow::Result<u64> {
        task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_id))
            .count(&self.conn)
            .await
            .context("count tasks by project failed")
    }

    async fn list_page(
        &self,
        page: PageRequest,
        predicate: &TaskPredicate,
    ) -> anyhow::Result<Page<Task>> {
        let paginator = task::Entity::find()
            .filter(predicate_condition(predicate))
            .order_by_desc(task::Column::Id)
            .paginate(&self.conn, page.size);
        let total = paginator.num_items().await.context("count tasks failed")?;
        let rows = paginator
            .fetch_page(page.page)
            .await
            .context("list tasks failed")?;
        let content = self.compose(rows).await?;
        Ok(Page::new(content, page, total))
    }
}
