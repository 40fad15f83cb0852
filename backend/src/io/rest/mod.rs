//! # REST API Interface Layer
//!
//! HTTP endpoints over the domain services. This layer handles:
//! - Request/response JSON serialization
//! - Identity extraction from headers
//! - Error translation from domain errors to HTTP status codes
//! - Request logging
//!
//! Identity is self-asserted: the caller supplies a contact handle and a
//! display name in headers, and the handle acts as the unique user key.
//! There is deliberately no stronger authentication at this layer.
//!
//! There is no push channel; clients are expected to poll the presence
//! view (a 30 second interval works well) and re-render from scratch.

pub mod child_apis;
pub mod group_apis;
pub mod presence_apis;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::domain::ServiceError;
use shared::UserIdentity;

/// Header carrying the caller's contact handle (the unique user key).
pub const USER_HANDLE_HEADER: &str = "x-user-handle";
/// Header carrying the caller's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Extracts the self-asserted caller identity from request headers.
pub struct Identity(pub UserIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let handle = parts
            .headers
            .get(USER_HANDLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or((StatusCode::BAD_REQUEST, "Missing x-user-handle header"))?
            .to_string();

        // A missing display name falls back to the handle rather than
        // rejecting the request
        let display_name = parts
            .headers
            .get(USER_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&handle)
            .to_string();

        Ok(Identity(UserIdentity {
            handle,
            display_name,
        }))
    }
}


/// Translate a domain error into an HTTP response.
pub fn error_response(context: &str, e: ServiceError) -> Response {
    error!("{}: {}", context, e);
    let status = match &e {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotMember => StatusCode::FORBIDDEN,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        // The completed half of a partial write is kept; the caller
        // should retry the whole operation
        ServiceError::PartialWrite { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string()).into_response()
}
