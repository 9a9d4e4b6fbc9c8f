//! Extractors that reject with `application/problem+json` instead of axum's
//! plain-text rejections.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use modkit::api::problem::ProblemResponse;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::api::rest::error::{from_parts, malformed_request, validation_problem};

/// JSON body that has been deserialized and validated.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let instance = req.uri().path().to_owned();
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rej| json_rejection(rej, &instance))?;
        value
            .validate()
            .map_err(|errs| validation_problem(&errs, &instance))?;
        Ok(Self(value))
    }
}

fn json_rejection(rej: JsonRejection, instance: &str) -> ProblemResponse {
    match rej {
        JsonRejection::MissingJsonContentType(_) => from_parts(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "TASKBOARD_UNSUPPORTED_MEDIA_TYPE",
            "Unsupported media type",
            rej.body_text(),
            instance,
        ),
        other => malformed_request(other.body_text(), instance),
    }
}

/// Query string that has been deserialized and validated.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let instance = parts.uri.path().to_owned();
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rej| malformed_request(rej.body_text(), &instance))?;
        value
            .validate()
            .map_err(|errs| validation_problem(&errs, &instance))?;
        Ok(Self(value))
    }
}

/// Numeric id taken from the single path parameter of a route.
#[derive(Debug, Clone, Copy)]
pub struct PathId(pub i64);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let instance = parts.uri.path().to_owned();
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rej| malformed_request(rej.body_text(), &instance))?;
        Ok(Self(id))
    }
}
