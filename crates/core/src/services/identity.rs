//! Voter identity resolution.
//!
//! Authentication itself happens elsewhere; this seam only answers "who is the
//! current voter, if anyone" for an opaque bearer credential.

use async_trait::async_trait;
use captionbattle_common::AppResult;
use captionbattle_db::{entities::profile, repositories::ProfileRepository};
use serde::Serialize;
use std::sync::Arc;

/// An authenticated voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voter {
    pub id: String,
    pub username: String,
}

impl From<profile::Model> for Voter {
    fn from(profile: profile::Model) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
        }
    }
}

/// Resolves a credential to the current voter.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The voter behind `token`, or `None` for an unknown or missing credential.
    async fn current_voter(&self, token: &str) -> AppResult<Option<Voter>>;
}

/// Type alias for a shared identity provider.
pub type IdentityProviderService = Arc<dyn IdentityProvider>;

/// Looks tokens up in the profile table.
#[derive(Clone)]
pub struct ProfileIdentityProvider {
    profile_repo: ProfileRepository,
}

impl ProfileIdentityProvider {
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository) -> Self {
        Self { profile_repo }
    }
}

#[async_trait]
impl IdentityProvider for ProfileIdentityProvider {
    async fn current_voter(&self, token: &str) -> AppResult<Option<Voter>> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self
            .profile_repo
            .find_by_token(token)
            .await?
            .map(Voter::from))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use captionbattle_db::test_utils::{into_shared, mock_db, profile_fixture};

    #[tokio::test]
    async fn test_known_token_resolves_voter() {
        let db = into_shared(mock_db().append_query_results([[profile_fixture("alice")]]));
        let provider = ProfileIdentityProvider::new(ProfileRepository::new(db));

        let voter = provider.current_voter("alice-token").await.unwrap();

        assert_eq!(
            voter,
            Some(Voter {
                id: "alice".to_string(),
                username: "alice".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_token_is_anonymous() {
        let db = into_shared(mock_db().append_query_results([Vec::<profile::Model>::new()]));
        let provider = ProfileIdentityProvider::new(ProfileRepository::new(db));

        assert!(provider.current_voter("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_token_skips_lookup() {
        let db = into_shared(mock_db());
        let provider = ProfileIdentityProvider::new(ProfileRepository::new(db));

        assert!(provider.current_voter("").await.unwrap().is_none());
    }
}
