//! Group endpoints: create, join by code, list, fetch, leave.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use super::{error_response, Identity};
use crate::AppState;
use shared::{CreateGroupRequest, JoinGroupRequest};

/// POST /api/groups
pub async fn create_group(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(request): Json<CreateGroupRequest>,
) -> Response {
    info!("REST: Creating group {:?} for {}", request.name, identity.handle);

    match state.group_service.create_group(&identity, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to create group", e),
    }
}

/// POST /api/groups/join
pub async fn join_group(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(request): Json<JoinGroupRequest>,
) -> Response {
    info!("REST: {} joining group by code", identity.handle);

    match state
        .group_service
        .join_group(&identity, &request.join_code)
        .await
    {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response("Failed to join group", e),
    }
}

/// GET /api/groups
pub async fn list_my_groups(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Response {
    match state.group_service.my_groups(&identity.handle).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response("Failed to list groups", e),
    }
}

/// GET /api/groups/:group_id
pub async fn get_group(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(group_id): Path<String>,
) -> Response {
    match state
        .group_service
        .get_group(&group_id, &identity.handle)
        .await
    {
        Ok(group) => Json(group).into_response(),
        Err(e) => error_response("Failed to get group", e),
    }
}

/// DELETE /api/groups/:group_id/membership
pub async fn leave_group(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(group_id): Path<String>,
) -> Response {
    info!("REST: {} leaving group {}", identity.handle, group_id);

    match state
        .group_service
        .leave_group(&group_id, &identity.handle)
        .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to leave group", e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_app;
    use super::super::{USER_HANDLE_HEADER, USER_NAME_HEADER};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use shared::{GroupListResponse, GroupResponse};
    use tower::ServiceExt;

    fn request(method: &str, uri: &str, handle: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header(USER_HANDLE_HEADER, handle)
            .header(USER_NAME_HEADER, "Dana")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        serde_json::from_slice(&bytes).expect("Failed to parse body")
    }

    #[tokio::test]
    async fn missing_handle_header_is_bad_request() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/groups")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_and_list_groups_round_trip() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/groups",
                "dana@example.com",
                json!({"name": "שכונת הפרחים", "description": null}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: GroupResponse = read_json(response).await;
        assert_eq!(created.group.name, "שכונת הפרחים");

        let response = app
            .oneshot(request("GET", "/api/groups", "dana@example.com", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let mine: GroupListResponse = read_json(response).await;
        assert_eq!(mine.groups.len(), 1);
        assert_eq!(mine.groups[0].id, created.group.id);
    }

    #[tokio::test]
    async fn unknown_join_code_is_not_found() {
        let app = test_app().await;

        let response = app
            .oneshot(request(
                "POST",
                "/api/groups/join",
                "dana@example.com",
                json!({"join_code": "NOPE99"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_group_name_is_bad_request() {
        let app = test_app().await;

        let response = app
            .oneshot(request(
                "POST",
                "/api/groups",
                "dana@example.com",
                json!({"name": "   ", "description": null}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
