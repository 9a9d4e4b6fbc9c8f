//! Composable task predicates.
//!
//! Each fragment maps an optional filter value to either no constraint or one
//! equality clause. Fragments combine with [`TaskPredicate::and`], whose
//! identity is [`TaskPredicate::always`], the unrestricted scan. Storage
//! adapters translate the clause list; [`TaskPredicate::matches`] evaluates
//! it in memory.

use crate::contract::model::{Task, TaskFilter, TaskPriority, TaskStatus};

/// One equality constraint on a task field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Status(TaskStatus),
    Priority(TaskPriority),
    Project(i64),
}

impl Clause {
    fn holds_for(&self, task: &Task) -> bool {
        match *self {
            Clause::Status(s) => task.status == s,
            Clause::Priority(p) => task.priority == p,
            Clause::Project(id) => task.project.id == id,
        }
    }
}

/// Conjunction of clauses. The empty conjunction accepts every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPredicate {
    clauses: Vec<Clause>,
}

impl TaskPredicate {
    pub fn always() -> Self {
        Self::default()
    }

    fn only(clause: Clause) -> Self {
        Self {
            clauses: vec![clause],
        }
    }

    /// Logical AND.
    pub fn and(mut self, other: TaskPredicate) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_unrestricted(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.clauses.iter().all(|c| c.holds_for(task))
    }

    /// Fold every populated field of `filter` over [`TaskPredicate::always`].
    pub fn from_filter(filter: &TaskFilter) -> Self {
        TaskPredicate::always()
            .and(has_status(filter.status))
            .and(has_priority(filter.priority))
            .and(in_project(filter.project_id))
    }
}

pub fn has_status(status: Option<TaskStatus>) -> TaskPredicate {
    status.map_or_else(TaskPredicate::always, |s| {
        TaskPredicate::only(Clause::Status(s))
    })
}

pub fn has_priority(priority: Option<TaskPriority>) -> TaskPredicate {
    priority.map_or_else(TaskPredicate::always, |p| {
        TaskPredicate::only(Clause::Priority(p))
    })
}

pub fn in_project(project_id: Option<i64>) -> TaskPredicate {
    project_id.map_or_else(TaskPredicate::always, |id| {
        TaskPredicate::only(Clause::Project(id))
    })
}
