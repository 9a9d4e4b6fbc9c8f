use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::contract::model::{
    EventRequest, NewProject, NewTask, NewUser, OwnerSummary, Project, ProjectUpdate, Task,
    TaskDraft, TaskFilter, TaskPriority, TaskStatus, TaskUpdate, User, UserUpdate,
};

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatusDto {
    Todo,
    Doing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriorityDto {
    Low,
    Medium,
    High,
}

impl From<TaskStatus> for TaskStatusDto {
    fn from(s: TaskStatus) -> Self {
        match s {
            TaskStatus::Todo => Self::Todo,
            TaskStatus::Doing => Self::Doing,
            TaskStatus::Done => Self::Done,
        }
    }
}

impl From<TaskStatusDto> for TaskStatus {
    fn from(s: TaskStatusDto) -> Self {
        match s {
            TaskStatusDto::Todo => Self::Todo,
            TaskStatusDto::Doing => Self::Doing,
            TaskStatusDto::Done => Self::Done,
        }
    }
}

impl From<TaskPriority> for TaskPriorityDto {
    fn from(p: TaskPriority) -> Self {
        match p {
            TaskPriority::Low => Self::Low,
            TaskPriority::Medium => Self::Medium,
            TaskPriority::High => Self::High,
        }
    }
}

impl From<TaskPriorityDto> for TaskPriority {
    fn from(p: TaskPriorityDto) -> Self {
        match p {
            TaskPriorityDto::Low => Self::Low,
            TaskPriorityDto::Medium => Self::Medium,
            TaskPriorityDto::High => Self::High,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Body of both user create and user update (full replace).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct UserRequest {
    #[validate(
        custom(function = "not_blank", message = "Name is required"),
        length(max = 100, message = "Name cannot exceed 100 characters")
    )]
    pub name: String,
    #[validate(
        custom(function = "not_blank", message = "Email is required"),
        email(message = "Email is not valid"),
        length(max = 120, message = "Email cannot exceed 120 characters")
    )]
    pub email: String,
}

/// Denormalized owner: no timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OwnerDto {
    pub id: i64,
    pub name: String,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    #[validate(
        custom(function = "not_blank", message = "Name is required"),
        length(max = 120, message = "Name cannot exceed 120 characters")
    )]
    pub name: String,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
    #[validate(
        required(message = "OwnerId is required"),
        range(min = 1, message = "OwnerId must be > 0")
    )]
    pub owner_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatusDto,
    pub priority: TaskPriorityDto,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub project: ProjectDto,
}

/// Task creation body; status/priority default to TODO/MEDIUM.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 150, message = "Title cannot exceed 150 characters")
    )]
    pub title: String,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    pub status: Option<TaskStatusDto>,
    pub priority: Option<TaskPriorityDto>,
    pub due_date: Option<NaiveDate>,
    #[validate(
        required(message = "ProjectId is required"),
        range(min = 1, message = "ProjectId must be > 0")
    )]
    pub project_id: Option<i64>,
}

/// Task creation body for `/api/projects/{projectId}/tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateForProjectRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 150, message = "Title cannot exceed 150 characters")
    )]
    pub title: String,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    pub status: Option<TaskStatusDto>,
    pub priority: Option<TaskPriorityDto>,
    pub due_date: Option<NaiveDate>,
}

/// Full task replacement; status and priority must be present.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 150, message = "Title cannot exceed 150 characters")
    )]
    pub title: String,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    #[validate(required(message = "Status is required"))]
    pub status: Option<TaskStatusDto>,
    #[validate(required(message = "Priority is required"))]
    pub priority: Option<TaskPriorityDto>,
    pub due_date: Option<NaiveDate>,
    #[validate(
        required(message = "ProjectId is required"),
        range(min = 1, message = "ProjectId must be > 0")
    )]
    pub project_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct EventRequestDto {
    #[validate(custom(function = "not_blank", message = "Message is required"))]
    pub message: String,
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Zero-based page index (default 0).
    pub page: Option<u64>,
    /// Page size (default 20).
    #[validate(range(min = 1, message = "size must be >= 1"))]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct TaskListQuery {
    pub page: Option<u64>,
    #[validate(range(min = 1, message = "size must be >= 1"))]
    pub size: Option<u64>,
    pub status: Option<TaskStatusDto>,
    pub priority: Option<TaskPriorityDto>,
    pub project_id: Option<i64>,
}

impl TaskListQuery {
    pub fn paging(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            size: self.size,
        }
    }

    pub fn filter(&self) -> TaskFilter {
        TaskFilter {
            status: self.status.map(Into::into),
            priority: self.priority.map(Into::into),
            project_id: self.project_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions between REST DTOs and contract models
// ---------------------------------------------------------------------------

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            created_at: u.created_at,
        }
    }
}

impl From<UserRequest> for NewUser {
    fn from(r: UserRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
        }
    }
}

impl From<UserRequest> for UserUpdate {
    fn from(r: UserRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
        }
    }
}

impl From<OwnerSummary> for OwnerDto {
    fn from(o: OwnerSummary) -> Self {
        Self {
            id: o.id,
            name: o.name,
            email: o.email,
        }
    }
}

impl From<Project> for ProjectDto {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            created_at: p.created_at,
            owner: p.owner.into(),
        }
    }
}

// The `required` validators run before these conversions; the zero fallback
// is never observed by the services.

impl From<ProjectRequest> for NewProject {
    fn from(r: ProjectRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            owner_id: r.owner_id.unwrap_or_default(),
        }
    }
}

impl From<ProjectRequest> for ProjectUpdate {
    fn from(r: ProjectRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            owner_id: r.owner_id.unwrap_or_default(),
        }
    }
}

impl From<Task> for TaskDto {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            status: t.status.into(),
            priority: t.priority.into(),
            created_at: t.created_at,
            due_date: t.due_date,
            project: t.project.into(),
        }
    }
}

impl From<TaskCreateRequest> for NewTask {
    fn from(r: TaskCreateRequest) -> Self {
        Self {
            title: r.title,
            description: r.description,
            status: r.status.map(Into::into),
            priority: r.priority.map(Into::into),
            due_date: r.due_date,
            project_id: r.project_id.unwrap_or_default(),
        }
    }
}

impl From<TaskCreateForProjectRequest> for TaskDraft {
    fn from(r: TaskCreateForProjectRequest) -> Self {
        Self {
            title: r.title,
            description: r.description,
            status: r.status.map(Into::into),
            priority: r.priority.map(Into::into),
            due_date: r.due_date,
        }
    }
}

/// Fails (naming the field) when status or priority is missing.
impl TryFrom<TaskUpdateRequest> for TaskUpdate {
    type Error = &'static str;

    fn try_from(r: TaskUpdateRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: r.title,
            description: r.description,
            status: r.status.ok_or("status")?.into(),
            priority: r.priority.ok_or("priority")?.into(),
            due_date: r.due_date,
            project_id: r.project_id.ok_or("projectId")?,
        })
    }
}

impl From<EventRequestDto> for EventRequest {
    fn from(r: EventRequestDto) -> Self {
        Self {
            message: r.message,
            source: r.source,
            event_type: r.event_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_of<T: Validate>(v: &T) -> Vec<String> {
        match v.validate() {
            Ok(()) => Vec::new(),
            Err(e) => {
                let mut fields: Vec<String> =
                    e.field_errors().keys().map(|k| k.to_string()).collect();
                fields.sort();
                fields
            }
        }
    }

    #[test]
    fn user_request_rules() {
        let ok = UserRequest {
            name: "Alice".into(),
            email: "a@x.com".into(),
        };
        assert!(errors_of(&ok).is_empty());

        let bad = UserRequest {
            name: "   ".into(),
            email: "not-an-email".into(),
        };
        assert_eq!(errors_of(&bad), vec!["email", "name"]);

        let long = UserRequest {
            name: "n".repeat(101),
            email: "a@x.com".into(),
        };
        assert_eq!(errors_of(&long), vec!["name"]);
    }

    #[test]
    fn task_update_requires_status_and_priority() {
        let req: TaskUpdateRequest = serde_json::from_value(serde_json::json!({
            "title": "Final",
            "projectId": 10
        }))
        .unwrap();
        assert_eq!(errors_of(&req), vec!["priority", "status"]);
        assert_eq!(TaskUpdate::try_from(req).unwrap_err(), "status");
    }

    #[test]
    fn task_create_accepts_missing_status_and_priority() {
        let req: TaskCreateRequest = serde_json::from_value(serde_json::json!({
            "title": "Draft",
            "projectId": 10,
            "dueDate": "2020-01-01"
        }))
        .unwrap();
        assert!(errors_of(&req).is_empty());

        let new_task = NewTask::from(req);
        assert_eq!(new_task.status, None);
        assert_eq!(new_task.priority, None);
        assert_eq!(new_task.due_date, NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn project_request_rejects_non_positive_owner() {
        let req: ProjectRequest = serde_json::from_value(serde_json::json!({
            "name": "Alpha",
            "ownerId": 0
        }))
        .unwrap();
        assert_eq!(errors_of(&req), vec!["owner_id"]);
    }

    #[test]
    fn enums_use_upper_case_labels() {
        let s: TaskStatusDto = serde_json::from_str("\"DOING\"").unwrap();
        assert_eq!(TaskStatus::from(s), TaskStatus::Doing);
        assert!(serde_json::from_str::<TaskStatusDto>("\"doing\"").is_err());
        assert_eq!(
            serde_json::to_string(&TaskPriorityDto::from(TaskPriority::High)).unwrap(),
            "\"HIGH\""
        );
    }

    #[test]
    fn event_type_is_serialized_as_type() {
        let req: EventRequestDto = serde_json::from_value(serde_json::json!({
            "message": "hi",
            "type": "DEPLOYED"
        }))
        .unwrap();
        assert_eq!(req.event_type.as_deref(), Some("DEPLOYED"));
        assert_eq!(req.source, None);
    }

    #[test]
    fn list_query_builds_filter() {
        let q = TaskListQuery {
            status: Some(TaskStatusDto::Done),
            project_id: Some(3),
            ..Default::default()
        };
        let f = q.filter();
        assert_eq!(f.status, Some(TaskStatus::Done));
        assert_eq!(f.priority, None);
        assert_eq!(f.project_id, Some(3));
    }
}
