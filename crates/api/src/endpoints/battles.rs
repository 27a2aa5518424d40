//! Battle generation endpoint.

use axum::{Json, Router, extract::State, routing::post};
use captionbattle_common::{AppResult, IdGenerator};
use captionbattle_core::BattleDeck;
use captionbattle_db::repositories::ImageFilter;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{extractors::MaybeVoter, middleware::AppState, response::ApiResponse};

/// Battle mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleMode {
    /// Two captions on the same image.
    #[default]
    Pairs,
    /// One caption at a time.
    Singles,
}

/// Battle request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRequest {
    /// Replays an earlier order when given.
    pub seed: Option<u64>,
    #[serde(default)]
    pub mode: BattleMode,
}

/// Battle response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleResponse {
    pub seed: u64,
    pub total: usize,
    #[serde(flatten)]
    pub deck: BattleDeck,
}

/// Build a shuffled battle sequence for the caller.
async fn generate(
    MaybeVoter(voter): MaybeVoter,
    State(state): State<AppState>,
    Json(req): Json<BattleRequest>,
) -> AppResult<ApiResponse<BattleResponse>> {
    let filter = ImageFilter {
        common_use_only: state.battle.common_use_only,
        ..ImageFilter::default()
    };
    let groups = state.catalog.load_groups(&filter, voter.as_ref()).await?;

    let seed = req.seed.unwrap_or_else(|| IdGenerator::new().generate_seed());
    let deck = match req.mode {
        BattleMode::Pairs => BattleDeck::pairs(&groups, seed, state.battle.max_pairs),
        BattleMode::Singles => BattleDeck::singles(&groups, seed),
    };
    debug!(seed, total = deck.len(), mode = ?req.mode, "Generated battles");

    Ok(ApiResponse::ok(BattleResponse {
        seed,
        total: deck.len(),
        deck,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/battles", post(generate))
}
