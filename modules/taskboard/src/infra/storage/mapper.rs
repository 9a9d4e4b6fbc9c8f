//! Row ⇄ contract model conversions.

use anyhow::Context;

use crate::contract::model::{OwnerSummary, Project, Task, TaskPriority, TaskStatus, User};
use crate::infra::storage::entity::{project, task, user};

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            created_at: m.created_at,
        }
    }
}

impl From<user::Model> for OwnerSummary {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
        }
    }
}

pub fn project_from_row(row: project::Model, owner: user::Model) -> Project {
    Project {
        id: row.id,
        name: row.name,
        description: row.description,
        owner: owner.into(),
        created_at: row.created_at,
    }
}

/// Stored enum labels are validated here; an unknown label means the row was
/// written by something other than this module.
pub fn task_from_row(row: task::Model, project: Project) -> anyhow::Result<Task> {
    let status: TaskStatus = row
        .status
        .parse()
        .with_context(|| format!("task {} has a corrupt status", row.id))?;
    let priority: TaskPriority = row
        .priority
        .parse()
        .with_context(|| format!("task {} has a corrupt priority", row.id))?;
    Ok(Task {
        id: row.id,
        title: row.title,
        description: row.description,
        status,
        priority,
        due_date: row.due_date,
        project,
        created_at: row.created_at,
    })
}
