//! API endpoints.

mod battles;
mod feed;
mod leaderboard;
mod votes;

use axum::{Router, http::StatusCode, response::IntoResponse};

use crate::middleware::AppState;
use crate::response::ApiResponse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(battles::router())
        .merge(feed::router())
        .merge(leaderboard::router())
        .nest("/votes", votes::router())
        .fallback(not_found)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        ApiResponse::err("NOT_FOUND", "Unknown endpoint"),
    )
}
