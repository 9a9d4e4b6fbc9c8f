use modkit::api::problem::{FieldViolation, Problem};
use utoipa::OpenApi;

use crate::api::rest::dto::{
    EventRequestDto, OwnerDto, ProjectDto, ProjectRequest, TaskCreateForProjectRequest,
    TaskCreateRequest, TaskDto, TaskPriorityDto, TaskStatusDto, TaskUpdateRequest, UserDto,
    UserRequest,
};
use crate::api::rest::handlers;

#[derive(OpenApi)]
#[openapi(
    info(title = "Taskboard API", description = "Users, projects, tasks and webhook events"),
    paths(
        handlers::create_user,
        handlers::get_user,
        handlers::list_users,
        handlers::update_user,
        handlers::delete_user,
        handlers::create_project,
        handlers::get_project,
        handlers::list_projects,
        handlers::update_project,
        handlers::delete_project,
        handlers::create_task,
        handlers::create_task_for_project,
        handlers::get_task,
        handlers::list_tasks,
        handlers::update_task,
        handlers::delete_task,
        handlers::send_event,
    ),
    components(schemas(
        UserDto,
        UserRequest,
        OwnerDto,
        ProjectDto,
        ProjectRequest,
        TaskDto,
        TaskCreateRequest,
        TaskCreateForProjectRequest,
        TaskUpdateRequest,
        TaskStatusDto,
        TaskPriorityDto,
        EventRequestDto,
        Problem,
        FieldViolation,
    )),
    tags(
        (name = "users", description = "User management"),
        (name = "projects", description = "Projects owned by users"),
        (name = "tasks", description = "Tasks and filtered task listing"),
        (name = "events", description = "Outbound webhook events"),
    )
)]
pub struct ApiDoc;
