//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_ticket, finance_report, list_roles, list_tickets, login, me, operations_report, signup,
    token, upload_profile_picture, AppState,
};
use super::middleware::{create_cors_layer, guard_layer};

/// Multipart framing allowance on top of the configured upload size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/token", post(token));

    let user_routes = Router::new()
        .route("/me", get(me))
        .route("/roles", get(list_roles));

    let file_routes = Router::new()
        .route("/profile-picture", post(upload_profile_picture))
        .layer(DefaultBodyLimit::max(
            app_state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ));

    let demo_routes = Router::new()
        .route("/reports/finance", get(finance_report))
        .route("/reports/operations", get(operations_report))
        .route("/support/tickets", get(list_tickets).post(create_ticket));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/files", file_routes)
        .nest("/dummy", demo_routes);

    let guard = app_state.guard.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    guard_layer(guard.clone(), req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
