//! Vote endpoints.

use std::collections::HashMap;

use axum::{Json, Router, extract::State, routing::post};
use captionbattle_common::AppResult;
use captionbattle_core::{VoteState, VoteValue};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::{AuthVoter, MaybeVoter},
    middleware::AppState,
    response::ApiResponse,
};

/// Submit vote request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteRequest {
    #[validate(length(min = 1, max = 64))]
    pub caption_id: String,
    /// `1` or `-1`.
    #[validate(range(min = -1, max = 1))]
    pub value: i16,
}

/// Submit vote response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteResponse {
    pub vote_state: VoteState,
}

/// Toggle a vote on a caption.
async fn submit(
    MaybeVoter(voter): MaybeVoter,
    State(state): State<AppState>,
    Json(req): Json<SubmitVoteRequest>,
) -> AppResult<ApiResponse<SubmitVoteResponse>> {
    req.validate()?;
    let value = VoteValue::try_from(req.value)?;

    let vote_state = state
        .vote_ledger
        .submit_vote(voter.as_ref(), &req.caption_id, value)
        .await?;

    Ok(ApiResponse::ok(SubmitVoteResponse { vote_state }))
}

/// The caller's own votes, keyed by caption.
async fn mine(
    AuthVoter(voter): AuthVoter,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<HashMap<String, VoteState>>> {
    let votes = state.vote_ledger.voter_votes(&voter).await?;
    Ok(ApiResponse::ok(votes))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit))
        .route("/mine", post(mine))
}
