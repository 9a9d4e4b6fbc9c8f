//! REST layer driven through the real router with `tower::ServiceExt::oneshot`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{test_router, test_router_with, StubWebhook};
use taskboard::domain::error::WebhookFailure;

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&v).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, value)
}

async fn create_user(router: &Router, name: &str, email: &str) -> Value {
    let (status, _, body) = call(
        router,
        Method::POST,
        "/api/users",
        Some(json!({ "name": name, "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn create_project(router: &Router, owner_id: i64, name: &str) -> Value {
    let (status, _, body) = call(
        router,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": name, "ownerId": owner_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn create_user_returns_201_with_location() -> Result<()> {
    let router = test_router().await;

    let (status, headers, body) = call(
        &router,
        Method::POST,
        "/api/users",
        Some(json!({ "name": "Alice", "email": "alice@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        &format!("/api/users/{id}")
    );
    assert_eq!(body["name"], "Alice");
    assert!(body["createdAt"].is_string());

    let (status, _, fetched) =
        call(&router, Method::GET, &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);
    Ok(())
}

#[tokio::test]
async fn invalid_user_body_lists_field_errors() -> Result<()> {
    let router = test_router().await;

    let (status, headers, body) = call(
        &router,
        Method::POST,
        "/api/users",
        Some(json!({ "name": " ", "email": "nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    assert_eq!(body["code"], "TASKBOARD_VALIDATION");
    let pointers: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["pointer"].as_str().unwrap())
        .collect();
    assert!(pointers.contains(&"/name"));
    assert!(pointers.contains(&"/email"));
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> Result<()> {
    let router = test_router().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_409() -> Result<()> {
    let router = test_router().await;
    create_user(&router, "A", "a@x.com").await;

    let (status, _, body) = call(
        &router,
        Method::POST,
        "/api/users",
        Some(json!({ "name": "B", "email": "A@X.COM" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TASKBOARD_CONFLICT");
    assert_eq!(body["instance"], "/api/users");
    Ok(())
}

#[tokio::test]
async fn unknown_ids_are_404_problems() -> Result<()> {
    let router = test_router().await;

    for (uri, code) in [
        ("/api/users/5", "TASKBOARD_USER_NOT_FOUND"),
        ("/api/projects/5", "TASKBOARD_PROJECT_NOT_FOUND"),
        ("/api/tasks/5", "TASKBOARD_TASK_NOT_FOUND"),
    ] {
        let (status, _, body) = call(&router, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["code"], code);
        assert_eq!(body["status"], 404);
    }
    Ok(())
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request() -> Result<()> {
    let router = test_router().await;
    let (status, _, body) = call(&router, Method::GET, "/api/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "TASKBOARD_MALFORMED_REQUEST");
    Ok(())
}

#[tokio::test]
async fn unknown_route_and_method_are_problems() -> Result<()> {
    let router = test_router().await;

    let (status, _, body) = call(&router, Method::GET, "/api/nothing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TASKBOARD_UNKNOWN_ENDPOINT");

    let (status, _, _) = call(&router, Method::PATCH, "/api/users", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

#[tokio::test]
async fn project_response_nests_owner_without_timestamp() -> Result<()> {
    let router = test_router().await;
    let owner = create_user(&router, "Owner", "owner@x.com").await;
    let project = create_project(&router, owner["id"].as_i64().unwrap(), "Alpha").await;

    assert_eq!(project["owner"]["id"], owner["id"]);
    assert_eq!(project["owner"]["email"], "owner@x.com");
    assert!(project["owner"].get("createdAt").is_none());
    assert!(project["createdAt"].is_string());
    Ok(())
}

#[tokio::test]
async fn project_owner_id_must_be_positive() -> Result<()> {
    let router = test_router().await;
    let (status, _, body) = call(
        &router,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": "Alpha", "ownerId": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["pointer"], "/ownerId");
    assert_eq!(body["errors"][0]["detail"], "OwnerId must be > 0");
    Ok(())
}

#[tokio::test]
async fn task_lifecycle_over_http() -> Result<()> {
    let router = test_router().await;
    let owner = create_user(&router, "Owner", "owner@x.com").await;
    let project = create_project(&router, owner["id"].as_i64().unwrap(), "Alpha").await;
    let project_id = project["id"].as_i64().unwrap();

    let (status, headers, task) = call(
        &router,
        Method::POST,
        &format!("/api/projects/{project_id}/tasks"),
        Some(json!({ "title": "Draft", "dueDate": "2030-01-15" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = task["id"].as_i64().unwrap();
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        &format!("/api/tasks/{task_id}")
    );
    assert_eq!(task["status"], "TODO");
    assert_eq!(task["priority"], "MEDIUM");
    assert_eq!(task["dueDate"], "2030-01-15");
    assert_eq!(task["project"]["id"], project_id);

    // Full replacement requires status and priority.
    let (status, _, body) = call(
        &router,
        Method::PUT,
        &format!("/api/tasks/{task_id}"),
        Some(json!({ "title": "Draft", "projectId": project_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Status is required"));

    let (status, _, updated) = call(
        &router,
        Method::PUT,
        &format!("/api/tasks/{task_id}"),
        Some(json!({
            "title": "Draft",
            "status": "DONE",
            "priority": "HIGH",
            "projectId": project_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "DONE");
    assert!(updated["dueDate"].is_null());

    let (status, _, _) = call(
        &router,
        Method::DELETE,
        &format!("/api/projects/{project_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, body) =
        call(&router, Method::DELETE, &format!("/api/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    Ok(())
}

#[tokio::test]
async fn task_list_filters_and_pages() -> Result<()> {
    let router = test_router().await;
    let owner = create_user(&router, "Owner", "owner@x.com").await;
    let project = create_project(&router, owner["id"].as_i64().unwrap(), "Alpha").await;
    let project_id = project["id"].as_i64().unwrap();

    for (title, status) in [("one", "TODO"), ("two", "DONE"), ("three", "DONE")] {
        let (code, _, body) = call(
            &router,
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": title, "status": status, "projectId": project_id })),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED, "{body}");
    }

    let (status, _, page) =
        call(&router, Method::GET, "/api/tasks?status=DONE&size=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalElements"], 2);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["size"], 1);
    assert_eq!(page["content"].as_array().unwrap().len(), 1);

    let (_, _, page) = call(
        &router,
        Method::GET,
        &format!("/api/tasks?projectId={project_id}&priority=MEDIUM"),
        None,
    )
    .await;
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["size"], 20);

    let (status, _, _) = call(&router, Method::GET, "/api/tasks?status=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = call(&router, Method::GET, "/api/tasks?size=1000", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["pointer"], "/size");
    Ok(())
}

#[tokio::test]
async fn page_beyond_sql_offset_range_is_a_bad_request() -> Result<()> {
    let router = test_router().await;
    create_user(&router, "Owner", "owner@x.com").await;

    for path in ["/api/users", "/api/projects", "/api/tasks"] {
        let uri = format!("{path}?page=1000000000000000000&size=20");
        let (status, _, body) = call(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {body}");
        assert_eq!(body["code"], "TASKBOARD_VALIDATION");
        assert_eq!(body["errors"][0]["pointer"], "/page");
    }

    // Largest representable offset is still a valid, empty page.
    let (status, _, body) = call(
        &router,
        Method::GET,
        "/api/users?page=9223372036854775807&size=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["content"].as_array().unwrap().len(), 0);
    assert_eq!(body["totalElements"], 1);
    Ok(())
}

#[tokio::test]
async fn task_for_missing_project_is_404() -> Result<()> {
    let router = test_router().await;
    let (status, _, body) = call(
        &router,
        Method::POST,
        "/api/tasks",
        Some(json!({ "title": "Ghost", "projectId": 999999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TASKBOARD_PROJECT_NOT_FOUND");

    let (_, _, page) = call(&router, Method::GET, "/api/tasks", None).await;
    assert_eq!(page["totalElements"], 0);
    Ok(())
}

#[tokio::test]
async fn event_success_returns_empty_200() -> Result<()> {
    let hook = Arc::new(StubWebhook::default());
    let router = test_router_with(hook.clone()).await;

    let (status, _, body) = call(
        &router,
        Method::POST,
        "/api/events",
        Some(json!({ "message": "hello", "type": "DEPLOYED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let seen = hook.seen.lock().unwrap();
    assert_eq!(seen[0].event_type, "DEPLOYED");
    assert_eq!(seen[0].source, "taskboard-api");
    Ok(())
}

#[tokio::test]
async fn event_failure_is_502() -> Result<()> {
    let hook = Arc::new(StubWebhook::failing(WebhookFailure::Timeout {
        after: Duration::from_secs(5),
    }));
    let router = test_router_with(hook).await;

    let (status, _, body) = call(
        &router,
        Method::POST,
        "/api/events",
        Some(json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "TASKBOARD_WEBHOOK_FAILED");
    Ok(())
}

#[tokio::test]
async fn blank_event_message_is_rejected() -> Result<()> {
    let router = test_router().await;
    let (status, _, _) = call(
        &router,
        Method::POST,
        "/api/events",
        Some(json!({ "message": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn openapi_and_health_are_served() -> Result<()> {
    let router = test_router().await;

    let (status, _, doc) = call(&router, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/tasks"].is_object());

    let (status, _, health) = call(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "UP");
    Ok(())
}
