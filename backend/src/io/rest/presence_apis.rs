//! Presence endpoints: signalling a visit, changing playground, ending a
//! visit, and the polled group view.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use super::{error_response, Identity};
use crate::AppState;
use shared::{ActiveVisitResponse, SignalPresenceRequest};

/// POST /api/groups/:group_id/signal
pub async fn signal_presence(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(group_id): Path<String>,
    Json(request): Json<SignalPresenceRequest>,
) -> Response {
    info!(
        "REST: {} signalling presence at {:?} in group {}",
        identity.handle, request.playground_name, group_id
    );

    match state
        .visit_service
        .signal(&group_id, &identity, request)
        .await
    {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to signal presence", e),
    }
}

/// POST /api/groups/:group_id/change-playground
pub async fn change_playground(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(group_id): Path<String>,
    Json(request): Json<SignalPresenceRequest>,
) -> Response {
    info!(
        "REST: {} changing playground to {:?} in group {}",
        identity.handle, request.playground_name, group_id
    );

    match state
        .visit_service
        .change_playground(&group_id, &identity, request)
        .await
    {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to change playground", e),
    }
}

/// POST /api/groups/:group_id/end-visit
pub async fn end_visit(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(group_id): Path<String>,
) -> Response {
    info!("REST: {} ending visit in group {}", identity.handle, group_id);

    match state
        .visit_service
        .end_visit(&group_id, &identity.handle)
        .await
    {
        // Ending with no active visit is a success, not an error
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to end visit", e),
    }
}

/// GET /api/groups/:group_id/my-visit
pub async fn my_active_visit(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(group_id): Path<String>,
) -> Response {
    match state
        .visit_service
        .my_active_visit(&group_id, &identity.handle)
        .await
    {
        Ok(visit) => Json(ActiveVisitResponse { visit }).into_response(),
        Err(e) => error_response("Failed to get active visit", e),
    }
}

/// GET /api/groups/:group_id/presence
pub async fn presence_view(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(group_id): Path<String>,
) -> Response {
    match state
        .presence_service
        .compute_view(&group_id, &identity.handle)
        .await
    {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response("Failed to compute presence view", e),
    }
}

/// GET /api/groups/:group_id/recent-playgrounds
pub async fn recent_playgrounds(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(group_id): Path<String>,
) -> Response {
    match state
        .presence_service
        .recent_names(&group_id, &identity.handle)
        .await
    {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response("Failed to list recent playgrounds", e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_app;
    use super::super::{USER_HANDLE_HEADER, USER_NAME_HEADER};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::json;
    use shared::GroupResponse;
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

    async fn create_group(app: &Router, handle: &str) -> String {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/groups",
                handle,
                json!({"name": "שכונת הפרחים", "description": null}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let created: GroupResponse = serde_json::from_slice(&bytes).expect("Failed to parse body");
        created.group.id
    }

    #[tokio::test]
    async fn non_member_presence_view_is_forbidden() {
        let app = test_app().await;
        let group_id = create_group(&app, "dana@example.com").await;

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/groups/{}/presence", group_id),
                "stranger@example.com",
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn blank_playground_name_is_bad_request() {
        let app = test_app().await;
        let group_id = create_group(&app, "dana@example.com").await;

        let response = app
            .oneshot(request(
                "POST",
                &format!("/api/groups/{}/signal", group_id),
                "dana@example.com",
                json!({"playground_name": "   ", "child_ids": []}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signal_then_presence_round_trip() {
        let app = test_app().await;
        let group_id = create_group(&app, "dana@example.com").await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/api/groups/{}/signal", group_id),
                "dana@example.com",
                json!({"playground_name": "בגן השקד", "child_ids": []}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/groups/{}/presence", group_id),
                "dana@example.com",
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let view: shared::PresenceViewResponse =
            serde_json::from_slice(&bytes).expect("Failed to parse body");
        assert_eq!(view.total_active, 1);
        assert_eq!(view.playgrounds[0].playground_name, "גן השקד");
    }
}
