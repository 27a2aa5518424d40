//! Leaderboard endpoint.

use axum::{Json, Router, extract::State, routing::post};
use captionbattle_common::AppResult;
use captionbattle_core::{Baseline, LeaderboardEntry, RankingEngine};
use captionbattle_db::repositories::ImageFilter;
use serde::Deserialize;
use validator::Validate;

use crate::{middleware::AppState, response::ApiResponse};

/// Leaderboard request.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRequest {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

/// Top captions across all listed images.
async fn leaderboard(
    State(state): State<AppState>,
    Json(req): Json<LeaderboardRequest>,
) -> AppResult<ApiResponse<Vec<LeaderboardEntry>>> {
    req.validate()?;

    let size = req
        .limit
        .map_or(state.battle.leaderboard_size, |limit| {
            limit.min(state.battle.leaderboard_size)
        });
    let filter = ImageFilter {
        common_use_only: state.battle.common_use_only,
        ..ImageFilter::default()
    };
    let groups = state.catalog.load_groups(&filter, None).await?;

    Ok(ApiResponse::ok(
        RankingEngine::new(size).leaderboard(&groups, &Baseline),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/leaderboard", post(leaderboard))
}
