//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use captionbattle_common::BattleConfig;
use captionbattle_core::{
    CatalogService, IdentityProvider, IdentityProviderService, VoteLedgerService,
};
use tracing::warn;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub vote_ledger: VoteLedgerService,
    pub catalog: CatalogService,
    pub identity: IdentityProviderService,
    pub battle: BattleConfig,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` into a [`captionbattle_core::Voter`]
/// request extension. Unknown tokens leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.identity.current_voter(token.trim()).await {
            Ok(Some(voter)) => {
                req.extensions_mut().insert(voter);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to resolve voter"),
        }
    }

    next.run(req).await
}
