//! # Playground Tracker Backend
//!
//! Contains all non-UI logic for the playground tracker application.
//!
//! This crate serves as the orchestration layer that brings together:
//! - **Domain**: presence sessions, name resolution, groups, children
//! - **Storage**: SQLite persistence behind typed repository traits
//! - **IO**: the REST interface that exposes functionality to clients
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! ```text
//! Client (polling UI)
//!     |
//! IO Layer (REST API, handlers)
//!     |
//! Domain Layer (Business logic, services)
//!     |
//! Storage Layer (Database, persistence)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Initialize and configure the application state
//! - Set up the REST API router with proper CORS configuration
//! - Coordinate between domain logic and data persistence

pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::domain::{
    system_clock, ChildService, GroupService, PlaygroundResolver, PresenceService, VisitService,
};
use crate::storage::DbConnection;

pub use domain::*;
pub use io::*;
pub use storage::*;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub group_service: GroupService,
    pub child_service: ChildService,
    pub visit_service: VisitService,
    pub presence_service: PresenceService,
}

/// Initialize the backend with all required services
pub async fn initialize_backend() -> Result<AppState> {
    info!("Setting up database");
    let db = Arc::new(DbConnection::init().await?);

    info!("Setting up domain model");
    let clock = system_clock();
    let resolver = PlaygroundResolver::new(db.clone(), clock.clone());
    let group_service = GroupService::new(db.clone(), db.clone(), clock.clone());
    let child_service = ChildService::new(db.clone(), clock.clone());
    let visit_service = VisitService::new(
        db.clone(),
        db.clone(),
        db.clone(),
        resolver,
        clock.clone(),
    );
    let presence_service = PresenceService::new(db.clone(), db, clock);

    info!("Setting up application state");
    Ok(AppState {
        group_service,
        child_service,
        visit_service,
        presence_service,
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    // Set up our application routes
    let api_routes = Router::new()
        .route(
            "/groups",
            get(io::group_apis::list_my_groups).post(io::group_apis::create_group),
        )
        .route("/groups/join", post(io::group_apis::join_group))
        .route("/groups/:group_id", get(io::group_apis::get_group))
        .route(
            "/groups/:group_id/membership",
            delete(io::group_apis::leave_group),
        )
        .route(
            "/children",
            get(io::child_apis::list_children).post(io::child_apis::create_child),
        )
        .route("/children/:child_id", delete(io::child_apis::delete_child))
        .route(
            "/groups/:group_id/signal",
            post(io::presence_apis::signal_presence),
        )
        .route(
            "/groups/:group_id/change-playground",
            post(io::presence_apis::change_playground),
        )
        .route(
            "/groups/:group_id/end-visit",
            post(io::presence_apis::end_visit),
        )
        .route(
            "/groups/:group_id/my-visit",
            get(io::presence_apis::my_active_visit),
        )
        .route(
            "/groups/:group_id/presence",
            get(io::presence_apis::presence_view),
        )
        .route(
            "/groups/:group_id/recent-playgrounds",
            get(io::presence_apis::recent_playgrounds),
        );

    // Define our main application router
    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
