//! REST endpoint handlers for the HTTP gateway.
//!
//! All read handlers go through the [`WorkloadDriver`]'s mirrors via the
//! shared [`AppState`]. None of them talk to the engine.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `POST` | `/start-simulation` | Launch the workload run |
//! | `GET` | `/status` | Summary counts |
//! | `GET` | `/subreddits` | Configured communities |
//! | `GET` | `/posts` | All mirrored posts |
//! | `GET` | `/comments/{post_id}` | Mirrored comments on a post |
//! | `GET` | `/feed/{username}` | First few mirrored posts |
//! | `GET` | `/direct-messages/{username}` | Mirrored DMs for a recipient |
//!
//! [`WorkloadDriver`]: agora_core::driver::WorkloadDriver

use std::sync::Arc;

use agora_types::PostId;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing simulation counts and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.driver.status().await;
    let run_state = if state.driver.is_started() {
        "STARTED"
    } else {
        "IDLE"
    };
    let booted_at = state.booted_at.format("%Y-%m-%d %H:%M:%S UTC");
    let active_users = status.active_users;
    let subreddits = status.subreddits;
    let total_posts = status.total_posts;
    let total_comments = status.total_comments;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Agora Gateway</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #ff7b39; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #ff7b39; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Agora Gateway</h1>
    <p class="subtitle">Up since {booted_at}</p>

    <p>Simulation: <span class="status">{run_state}</span></p>

    <div>
        <div class="metric">
            <div class="label">Users</div>
            <div class="value">{active_users}</div>
        </div>
        <div class="metric">
            <div class="label">Subreddits</div>
            <div class="value">{subreddits}</div>
        </div>
        <div class="metric">
            <div class="label">Post buckets</div>
            <div class="value">{total_posts}</div>
        </div>
        <div class="metric">
            <div class="label">Comment buckets</div>
            <div class="value">{total_comments}</div>
        </div>
    </div>

    <h2>API Endpoints</h2>
    <ul>
        <li>POST /start-simulation -- Launch the workload run</li>
        <li>GET <a href="/status">/status</a> -- Summary counts</li>
        <li>GET <a href="/subreddits">/subreddits</a> -- Configured communities</li>
        <li>GET <a href="/posts">/posts</a> -- All posts</li>
        <li>GET /comments/{{post_id}} -- Comments on a post</li>
        <li>GET /feed/{{username}} -- A user's feed</li>
        <li>GET /direct-messages/{{username}} -- A user's direct messages</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// POST /start-simulation
// ---------------------------------------------------------------------------

/// Start the workload run on a background task.
///
/// Returns `202 Accepted` immediately; the run continues after the
/// response. A second call returns `409 Conflict`.
pub async fn start_simulation(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let _run = state.driver.start_in_background()?;
    info!("Simulation started via gateway");
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "message": "Simulation started" })),
    ))
}

// ---------------------------------------------------------------------------
// Mirror reads
// ---------------------------------------------------------------------------

/// Return summary counts.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let status = state.driver.status().await;
    Ok(Json(serde_json::to_value(status)?))
}

/// Return the configured communities in configured order.
pub async fn list_subreddits(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let subreddits = state.driver.subreddits().await;
    Json(serde_json::json!({ "subreddits": subreddits }))
}

/// Return every mirrored post.
pub async fn list_posts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let posts = state.driver.posts().await;
    Json(serde_json::json!({ "posts": posts }))
}

/// Return mirrored comments on a post. Unknown posts yield an empty list.
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let post_id = post_id
        .parse::<PostId>()
        .map_err(|e| ObserverError::InvalidPostId(e.to_string()))?;
    let comments = state.driver.comments(post_id).await;
    Ok(Json(serde_json::json!({ "comments": comments })))
}

/// Return the first few mirrored posts.
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    let feed = state.driver.feed(&username).await;
    Json(serde_json::json!({ "feed": feed }))
}

/// Return mirrored direct messages for a recipient.
pub async fn list_direct_messages(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    let messages = state.driver.direct_messages(&username).await;
    Json(serde_json::json!({ "direct_messages": messages }))
}
