use std::sync::Arc;

use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use utoipa::OpenApi;

use crate::api::rest::error::{from_parts, unknown_endpoint};
use crate::api::rest::handlers;
use crate::api::rest::openapi::ApiDoc;
use crate::domain::service::Services;

/// Mount every taskboard endpoint on `router`, together with `/openapi.json`,
/// `/health` and problem+json fallbacks for unknown paths and methods.
pub fn register_routes(router: Router, services: Arc<Services>) -> anyhow::Result<Router> {
    let router = router
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route(
            "/api/projects/{id}/tasks",
            axum::routing::post(handlers::create_task_for_project),
        )
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route(
            "/api/tasks/{id}",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/api/events", axum::routing::post(handlers::send_event))
        .route("/openapi.json", get(openapi_json))
        .route("/health", get(health))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(Extension(services));

    Ok(router)
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "UP" }))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    unknown_endpoint(uri.path())
}

async fn method_not_allowed(uri: Uri) -> impl IntoResponse {
    from_parts(
        StatusCode::METHOD_NOT_ALLOWED,
        "TASKBOARD_METHOD_NOT_ALLOWED",
        "Method not allowed",
        format!("{} does not support this method", uri.path()),
        uri.path(),
    )
}
