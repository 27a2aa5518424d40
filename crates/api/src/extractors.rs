//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use captionbattle_common::AppError;
use captionbattle_core::Voter;

/// Authenticated voter extractor.
#[derive(Debug, Clone)]
pub struct AuthVoter(pub Voter);

impl<S> FromRequestParts<S> for AuthVoter
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // set by auth middleware
        parts
            .extensions
            .get::<Voter>()
            .cloned()
            .map(AuthVoter)
            .ok_or(AppError::Unauthenticated)
    }
}

/// Optional voter extractor.
#[derive(Debug, Clone)]
pub struct MaybeVoter(pub Option<Voter>);

impl<S> FromRequestParts<S> for MaybeVoter
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Voter>().cloned()))
    }
}
