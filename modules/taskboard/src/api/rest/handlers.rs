use std::sync::Arc;

use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Extension,
};
use modkit::api::problem::{FieldViolation, Problem, ProblemResponse};
use modkit::{Page, PageRequest};
use serde::Serialize;
use tracing::{error, info};

use crate::api::rest::dto::{
    EventRequestDto, PageQuery, ProjectDto, ProjectRequest, TaskCreateForProjectRequest,
    TaskCreateRequest, TaskDto, TaskListQuery, TaskUpdateRequest, UserDto, UserRequest,
};
use crate::api::rest::error::{from_parts, map_domain_error};
use crate::api::rest::extract::{PathId, ValidJson, ValidQuery};
use crate::contract::model::TaskUpdate;
use crate::domain::service::{ServiceConfig, Services};

fn paging_problem(field: &str, detail: String, instance: &str) -> ProblemResponse {
    let mut resp = from_parts(
        StatusCode::BAD_REQUEST,
        "TASKBOARD_VALIDATION",
        "Validation error",
        detail.clone(),
        instance,
    );
    resp.0 = resp.0.with_errors(vec![FieldViolation::new(field, detail)]);
    resp
}

/// Resolve paging parameters against the configured limits.
/// The row offset `page * size` must fit the signed 64-bit SQL OFFSET.
fn page_request(
    query: &PageQuery,
    config: &ServiceConfig,
    instance: &str,
) -> Result<PageRequest, ProblemResponse> {
    let size = query.size.unwrap_or(config.default_page_size);
    if size > config.max_page_size {
        let detail = format!("size must be <= {}", config.max_page_size);
        return Err(paging_problem("size", detail, instance));
    }
    let page = query.page.unwrap_or(0);
    match page.checked_mul(size) {
        Some(offset) if offset <= i64::MAX as u64 => Ok(PageRequest::new(page, size)),
        _ => {
            let detail = format!("page is too large for size {size}");
            Err(paging_problem("page", detail, instance))
        }
    }
}

fn created<T: Serialize>(location: String, body: T) -> Response {
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(body),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "Created user", body = UserDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Email already in use", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn create_user(
    uri: Uri,
    Extension(svc): Extension<Arc<Services>>,
    ValidJson(req_body): ValidJson<UserRequest>,
) -> Result<Response, ProblemResponse> {
    info!("Creating user");

    match svc.users.create_user(req_body.into()).await {
        Ok(user) => Ok(created(
            format!("/api/users/{}", user.id),
            UserDto::from(user),
        )),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn get_user(
    Extension(svc): Extension<Arc<Services>>,
    PathId(id): PathId,
    uri: Uri,
) -> Result<Json<UserDto>, ProblemResponse> {
    info!("Getting user with id: {}", id);

    match svc.users.get_user(id).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to get user {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// List users, newest first
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of users", body = Page<UserDto>),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn list_users(
    Extension(svc): Extension<Arc<Services>>,
    ValidQuery(query): ValidQuery<PageQuery>,
    uri: Uri,
) -> Result<Json<Page<UserDto>>, ProblemResponse> {
    info!("Listing users with query: {:?}", query);
    let page = page_request(&query, &svc.config, uri.path())?;

    match svc.users.list_users(page).await {
        Ok(users) => Ok(Json(users.map_items(UserDto::from))),
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Replace a user's name and email
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Email already in use", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn update_user(
    uri: Uri,
    Extension(svc): Extension<Arc<Services>>,
    PathId(id): PathId,
    ValidJson(req_body): ValidJson<UserRequest>,
) -> Result<Json<UserDto>, ProblemResponse> {
    info!("Updating user {}", id);

    match svc.users.update_user(id, req_body.into()).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to update user {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete a user that owns no projects
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "User still owns projects", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn delete_user(
    Extension(svc): Extension<Arc<Services>>,
    PathId(id): PathId,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting user {}", id);

    match svc.users.delete_user(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete user {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    request_body = ProjectRequest,
    responses(
        (status = 201, description = "Created project", body = ProjectDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Owner not found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Name already used by this owner", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn create_project(
    uri: Uri,
    Extension(svc): Extension<Arc<Services>>,
    ValidJson(req_body): ValidJson<ProjectRequest>,
) -> Result<Response, ProblemResponse> {
    info!("Creating project");

    match svc.projects.create_project(req_body.into()).await {
        Ok(project) => Ok(created(
            format!("/api/projects/{}", project.id),
            ProjectDto::from(project),
        )),
        Err(e) => {
            error!("Failed to create project: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project found", body = ProjectDto),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn get_project(
    Extension(svc): Extension<Arc<Services>>,
    PathId(id): PathId,
    uri: Uri,
) -> Result<Json<ProjectDto>, ProblemResponse> {
    info!("Getting project with id: {}", id);

    match svc.projects.get_project(id).await {
        Ok(project) => Ok(Json(ProjectDto::from(project))),
        Err(e) => {
            error!("Failed to get project {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of projects", body = Page<ProjectDto>),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn list_projects(
    Extension(svc): Extension<Arc<Services>>,
    ValidQuery(query): ValidQuery<PageQuery>,
    uri: Uri,
) -> Result<Json<Page<ProjectDto>>, ProblemResponse> {
    info!("Listing projects with query: {:?}", query);
    let page = page_request(&query, &svc.config, uri.path())?;

    match svc.projects.list_projects(page).await {
        Ok(projects) => Ok(Json(projects.map_items(ProjectDto::from))),
        Err(e) => {
            error!("Failed to list projects: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = i64, Path, description = "Project id")),
    request_body = ProjectRequest,
    responses(
        (status = 200, description = "Updated project", body = ProjectDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Project or owner not found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Name already used by this owner", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn update_project(
    uri: Uri,
    Extension(svc): Extension<Arc<Services>>,
    PathId(id): PathId,
    ValidJson(req_body): ValidJson<ProjectRequest>,
) -> Result<Json<ProjectDto>, ProblemResponse> {
    info!("Updating project {}", id);

    match svc.projects.update_project(id, req_body.into()).await {
        Ok(project) => Ok(Json(ProjectDto::from(project))),
        Err(e) => {
            error!("Failed to update project {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = i64, Path, description = "Project id")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Project still has tasks", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn delete_project(
    Extension(svc): Extension<Arc<Services>>,
    PathId(id): PathId,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting project {}", id);

    match svc.projects.delete_project(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete project {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    request_body = TaskCreateRequest,
    responses(
        (status = 201, description = "Created task", body = TaskDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Project not found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Title already used in this project", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn create_task(
    uri: Uri,
    Extension(svc): Extension<Arc<Services>>,
    ValidJson(req_body): ValidJson<TaskCreateRequest>,
) -> Result<Response, ProblemResponse> {
    info!("Creating task");

    match svc.tasks.create_task(req_body.into()).await {
        Ok(task) => Ok(created(format!("/api/tasks/{}", task.id), TaskDto::from(task))),
        Err(e) => {
            error!("Failed to create task: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Create a task inside the project named by the path
#[utoipa::path(
    post,
    path = "/api/projects/{id}/tasks",
    tag = "tasks",
    params(("id" = i64, Path, description = "Project id")),
    request_body = TaskCreateForProjectRequest,
    responses(
        (status = 201, description = "Created task", body = TaskDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Project not found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Title already used in this project", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn create_task_for_project(
    uri: Uri,
    Extension(svc): Extension<Arc<Services>>,
    PathId(project_id): PathId,
    ValidJson(req_body): ValidJson<TaskCreateForProjectRequest>,
) -> Result<Response, ProblemResponse> {
    info!("Creating task in project {}", project_id);

    match svc
        .tasks
        .create_task_for_project(project_id, req_body.into())
        .await
    {
        Ok(task) => Ok(created(format!("/api/tasks/{}", task.id), TaskDto::from(task))),
        Err(e) => {
            error!("Failed to create task in project {}: {}", project_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task found", body = TaskDto),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn get_task(
    Extension(svc): Extension<Arc<Services>>,
    PathId(id): PathId,
    uri: Uri,
) -> Result<Json<TaskDto>, ProblemResponse> {
    info!("Getting task with id: {}", id);

    match svc.tasks.get_task(id).await {
        Ok(task) => Ok(Json(TaskDto::from(task))),
        Err(e) => {
            error!("Failed to get task {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// List tasks; absent filters do not restrict the result
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    params(TaskListQuery),
    responses(
        (status = 200, description = "Page of matching tasks", body = Page<TaskDto>),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn list_tasks(
    Extension(svc): Extension<Arc<Services>>,
    ValidQuery(query): ValidQuery<TaskListQuery>,
    uri: Uri,
) -> Result<Json<Page<TaskDto>>, ProblemResponse> {
    info!("Listing tasks with query: {:?}", query);
    let page = page_request(&query.paging(), &svc.config, uri.path())?;

    match svc.tasks.list_tasks(page, query.filter()).await {
        Ok(tasks) => Ok(Json(tasks.map_items(TaskDto::from))),
        Err(e) => {
            error!("Failed to list tasks: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    request_body = TaskUpdateRequest,
    responses(
        (status = 200, description = "Updated task", body = TaskDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Task or project not found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Title already used in this project", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn update_task(
    uri: Uri,
    Extension(svc): Extension<Arc<Services>>,
    PathId(id): PathId,
    ValidJson(req_body): ValidJson<TaskUpdateRequest>,
) -> Result<Json<TaskDto>, ProblemResponse> {
    info!("Updating task {}", id);

    // Validation already rejected missing fields, so this only fails if the
    // validator and the conversion disagree.
    let update = TaskUpdate::try_from(req_body).map_err(|field| {
        from_parts(
            StatusCode::BAD_REQUEST,
            "TASKBOARD_VALIDATION",
            "Validation error",
            format!("{field} is required"),
            uri.path(),
        )
    })?;

    match svc.tasks.update_task(id, update).await {
        Ok(task) => Ok(Json(TaskDto::from(task))),
        Err(e) => {
            error!("Failed to update task {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn delete_task(
    Extension(svc): Extension<Arc<Services>>,
    PathId(id): PathId,
    uri: Uri,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting task {}", id);

    match svc.tasks.delete_task(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete task {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Forward an event to the configured webhook; 200 with an empty body on success
#[utoipa::path(
    post,
    path = "/api/events",
    tag = "events",
    request_body = EventRequestDto,
    responses(
        (status = 200, description = "Event delivered"),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 502, description = "Webhook delivery failed", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn send_event(
    uri: Uri,
    Extension(svc): Extension<Arc<Services>>,
    ValidJson(req_body): ValidJson<EventRequestDto>,
) -> Result<StatusCode, ProblemResponse> {
    info!("Sending event");

    match svc.events.send(req_body.into()).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) => {
            error!("Failed to send event: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}
