//! Child endpoints. Children are scoped to the calling parent; there is
//! no way to read or modify another parent's children through this API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use super::{error_response, Identity};
use crate::AppState;
use shared::CreateChildRequest;

/// POST /api/children
pub async fn create_child(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(request): Json<CreateChildRequest>,
) -> Response {
    info!("REST: Adding child {:?} for {}", request.name, identity.handle);

    match state.child_service.add_child(&identity, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to add child", e),
    }
}

/// GET /api/children
pub async fn list_children(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Response {
    match state.child_service.list_children(&identity.handle).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response("Failed to list children", e),
    }
}

/// DELETE /api/children/:child_id
pub async fn delete_child(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(child_id): Path<String>,
) -> Response {
    info!("REST: Removing child {} for {}", child_id, identity.handle);

    match state
        .child_service
        .remove_child(&identity.handle, &child_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to remove child", e),
    }
}
