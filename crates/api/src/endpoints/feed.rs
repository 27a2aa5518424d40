//! Caption feed endpoint.

use axum::{Json, Router, extract::State, routing::post};
use captionbattle_common::AppResult;
use captionbattle_core::{Baseline, FeedQuery, FeedSort, ImageGroup, RankingEngine};
use captionbattle_db::repositories::ImageFilter;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::{extractors::MaybeVoter, middleware::AppState, response::ApiResponse};

/// Feed request.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    #[validate(length(max = 200))]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: FeedSort,
    #[serde(default)]
    pub unvoted_only: bool,
    /// Only images created at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

/// Grouped captions with counts and the caller's votes.
async fn feed(
    MaybeVoter(voter): MaybeVoter,
    State(state): State<AppState>,
    Json(req): Json<FeedRequest>,
) -> AppResult<ApiResponse<Vec<ImageGroup>>> {
    req.validate()?;

    let filter = ImageFilter {
        common_use_only: state.battle.common_use_only,
        since: req.since,
        ..ImageFilter::default()
    };
    let groups = state.catalog.load_groups(&filter, voter.as_ref()).await?;

    let query = FeedQuery {
        search: req.search,
        sort: req.sort,
        unvoted_only: req.unvoted_only,
    };
    Ok(ApiResponse::ok(RankingEngine::feed(groups, &query, &Baseline)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/feed", post(feed))
}
