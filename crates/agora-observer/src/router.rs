//! Axum router construction for the HTTP gateway.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the gateway.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `POST /start-simulation` -- launch the workload run
/// - `GET /status` -- summary counts
/// - `GET /subreddits` -- configured communities
/// - `GET /posts` -- all mirrored posts
/// - `GET /comments/{post_id}` -- comments on a post
/// - `GET /feed/{username}` -- a user's feed
/// - `GET /direct-messages/{username}` -- a user's direct messages
///
/// CORS allows any origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Control
        .route("/start-simulation", post(handlers::start_simulation))
        // Mirror reads
        .route("/status", get(handlers::get_status))
        .route("/subreddits", get(handlers::list_subreddits))
        .route("/posts", get(handlers::list_posts))
        .route("/comments/{post_id}", get(handlers::list_comments))
        .route("/feed/{username}", get(handlers::get_feed))
        .route(
            "/direct-messages/{username}",
            get(handlers::list_direct_messages),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
