use axum::http::StatusCode;
use modkit::api::problem::{FieldViolation, Problem, ProblemResponse};
use validator::ValidationErrors;

use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.example.com/{}", code))
        .with_code(code)
        .with_instance(instance)
        .with_current_span();

    ProblemResponse(problem)
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { .. } | DomainError::OwnerNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "TASKBOARD_USER_NOT_FOUND",
            "User not found",
            e.to_string(),
            instance,
        ),
        DomainError::ProjectNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "TASKBOARD_PROJECT_NOT_FOUND",
            "Project not found",
            e.to_string(),
            instance,
        ),
        DomainError::TaskNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "TASKBOARD_TASK_NOT_FOUND",
            "Task not found",
            e.to_string(),
            instance,
        ),
        DomainError::EmailAlreadyExists { .. }
        | DomainError::ProjectNameConflict { .. }
        | DomainError::TaskTitleConflict { .. }
        | DomainError::UserHasProjects { .. }
        | DomainError::ProjectHasTasks { .. } => from_parts(
            StatusCode::CONFLICT,
            "TASKBOARD_CONFLICT",
            "Conflict",
            e.to_string(),
            instance,
        ),
        DomainError::Validation { field, message } => {
            let mut resp = from_parts(
                StatusCode::BAD_REQUEST,
                "TASKBOARD_VALIDATION",
                "Validation error",
                e.to_string(),
                instance,
            );
            resp.0 = resp.0.with_errors(vec![FieldViolation::new(field, message.clone())]);
            resp
        }
        DomainError::WebhookDeliveryFailed { cause } => {
            tracing::warn!(error = %cause, "Webhook delivery failed");
            from_parts(
                StatusCode::BAD_GATEWAY,
                "TASKBOARD_WEBHOOK_FAILED",
                "Bad Gateway",
                format!("Failed to send webhook event: {cause}"),
                instance,
            )
        }
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "TASKBOARD_INTERNAL",
                "Internal error",
                "An internal error occurred",
                instance,
            )
        }
    }
}

/// 400 problem listing every rejected field, JSON-pointer style (`/ownerId`).
pub fn validation_problem(errors: &ValidationErrors, instance: &str) -> ProblemResponse {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let name = camel_case(&field);
            errs.iter()
                .map(|err| {
                    let detail = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", err.code));
                    FieldViolation::new(&name, detail)
                })
                .collect::<Vec<_>>()
        })
        .collect();
    violations.sort_by(|a, b| a.pointer.cmp(&b.pointer));

    let detail = violations
        .iter()
        .map(|v| v.detail.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let mut resp = from_parts(
        StatusCode::BAD_REQUEST,
        "TASKBOARD_VALIDATION",
        "Validation error",
        detail,
        instance,
    );
    resp.0 = resp.0.with_errors(violations);
    resp
}

/// 400 problem for an unreadable body, query string or path segment.
pub fn malformed_request(detail: impl Into<String>, instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::BAD_REQUEST,
        "TASKBOARD_MALFORMED_REQUEST",
        "Malformed request",
        detail,
        instance,
    )
}

/// 404 for paths no route matches.
pub fn unknown_endpoint(instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::NOT_FOUND,
        "TASKBOARD_UNKNOWN_ENDPOINT",
        "Not Found",
        format!("No endpoint for {instance}"),
        instance,
    )
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}
