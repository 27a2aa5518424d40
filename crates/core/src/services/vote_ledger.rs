//! Durable tri-state vote ledger.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use captionbattle_common::{AppError, AppResult, IdGenerator};
use captionbattle_db::{entities::caption_vote, repositories::CaptionVoteRepository};
use chrono::Utc;
use sea_orm::Set;
use tracing::{debug, info, warn};

use crate::optimistic::VoteSubmitter;
use crate::services::identity::Voter;
use crate::services::tally_cache::{NoOpInvalidator, ViewInvalidator, ViewInvalidatorService};
use crate::vote::{AggregateCount, VoteState, VoteValue};

/// Vote ledger service.
///
/// Holds at most one row per (voter, caption). Writes are single-row and
/// unlocked; concurrent requests from the same voter resolve last write wins.
#[derive(Clone)]
pub struct VoteLedgerService {
    vote_repo: CaptionVoteRepository,
    invalidator: ViewInvalidatorService,
    id_gen: IdGenerator,
}

impl VoteLedgerService {
    /// Create a new vote ledger with no cached views to invalidate.
    #[must_use]
    pub fn new(vote_repo: CaptionVoteRepository) -> Self {
        Self {
            vote_repo,
            invalidator: Arc::new(NoOpInvalidator),
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new vote ledger that invalidates `invalidator` after each write.
    #[must_use]
    pub fn with_invalidator(
        vote_repo: CaptionVoteRepository,
        invalidator: ViewInvalidatorService,
    ) -> Self {
        Self {
            vote_repo,
            invalidator,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle `value` on a caption for the current voter.
    ///
    /// No row inserts, the same polarity deletes, the opposite polarity updates
    /// in place. Returns the resulting state.
    pub async fn submit_vote(
        &self,
        voter: Option<&Voter>,
        caption_id: &str,
        value: VoteValue,
    ) -> AppResult<VoteState> {
        let voter = voter.ok_or(AppError::Unauthenticated)?;

        let existing = self
            .vote_repo
            .find_by_profile_and_caption(&voter.id, caption_id)
            .await?;
        let current = existing.as_ref().map_or(Ok(VoteState::None), row_state)?;
        let next = current.toggle(value);

        info!(
            profile_id = %voter.id,
            caption_id = %caption_id,
            from = current.as_i16(),
            to = next.as_i16(),
            "Submitting vote"
        );

        self.write(&voter.id, caption_id, existing, next).await?;
        Ok(next)
    }

    /// Force the durable state of a caption vote.
    ///
    /// Used to undo the persisted half of a comparison whose other half failed.
    pub async fn restore_vote(
        &self,
        voter: Option<&Voter>,
        caption_id: &str,
        target: VoteState,
    ) -> AppResult<VoteState> {
        let voter = voter.ok_or(AppError::Unauthenticated)?;

        let existing = self
            .vote_repo
            .find_by_profile_and_caption(&voter.id, caption_id)
            .await?;

        warn!(
            profile_id = %voter.id,
            caption_id = %caption_id,
            to = target.as_i16(),
            "Restoring vote"
        );

        self.write(&voter.id, caption_id, existing, target).await?;
        Ok(target)
    }

    async fn write(
        &self,
        profile_id: &str,
        caption_id: &str,
        existing: Option<caption_vote::Model>,
        target: VoteState,
    ) -> AppResult<()> {
        match (existing, target.value()) {
            (None, None) => return Ok(()),
            (None, Some(value)) => {
                let now = Utc::now();
                let model = caption_vote::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    caption_id: Set(caption_id.to_string()),
                    profile_id: Set(profile_id.to_string()),
                    vote_value: Set(value.as_i16()),
                    created_at: Set(now.into()),
                    modified_at: Set(None),
                };
                self.vote_repo.create(model).await?;
            }
            (Some(row), None) => {
                self.vote_repo.delete(&row.id).await?;
            }
            (Some(row), Some(value)) if row.vote_value == value.as_i16() => return Ok(()),
            (Some(row), Some(value)) => {
                self.vote_repo.update_value(row, value.as_i16()).await?;
            }
        }

        if let Err(e) = self.invalidator.invalidate_caption(caption_id).await {
            warn!(caption_id = %caption_id, error = %e, "Failed to invalidate cached tally");
        }
        Ok(())
    }

    /// The voter's own votes, keyed by caption.
    pub async fn voter_votes(&self, voter: &Voter) -> AppResult<HashMap<String, VoteState>> {
        let rows = self.vote_repo.find_by_profile(&voter.id).await?;
        Ok(rows
            .iter()
            .filter_map(|row| match row_state(row) {
                Ok(state) => Some((row.caption_id.clone(), state)),
                Err(e) => {
                    debug!(vote_id = %row.id, error = %e, "Skipping malformed vote row");
                    None
                }
            })
            .collect())
    }

    /// Live tally of one caption.
    pub async fn caption_tally(&self, caption_id: &str) -> AppResult<AggregateCount> {
        let rows = self.vote_repo.find_by_caption(caption_id).await?;
        Ok(AggregateCount::tally(
            rows.iter().filter_map(|row| row_state(row).ok()),
        ))
    }
}

fn row_state(row: &caption_vote::Model) -> AppResult<VoteState> {
    VoteValue::try_from(row.vote_value).map(VoteState::from).map_err(|_| {
        AppError::Persistence(format!(
            "vote {} holds invalid value {}",
            row.id, row.vote_value
        ))
    })
}

/// Submits a voter's optimistic intents straight to the in-process ledger.
#[derive(Clone)]
pub struct LedgerSubmitter {
    ledger: VoteLedgerService,
    voter: Option<Voter>,
}

impl LedgerSubmitter {
    #[must_use]
    pub const fn new(ledger: VoteLedgerService, voter: Option<Voter>) -> Self {
        Self { ledger, voter }
    }
}

#[async_trait]
impl VoteSubmitter for LedgerSubmitter {
    async fn submit_vote(&self, caption_id: &str, value: VoteValue) -> AppResult<VoteState> {
        self.ledger
            .submit_vote(self.voter.as_ref(), caption_id, value)
            .await
    }

    async fn restore_vote(&self, caption_id: &str, state: VoteState) -> AppResult<VoteState> {
        self.ledger
            .restore_vote(self.voter.as_ref(), caption_id, state)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::optimistic::{LocalVote, OptimisticVoteStore};
    use crate::services::tally_cache::TallyCache;
    use captionbattle_db::test_utils::{into_shared, mock_db, one_row_affected, vote_fixture};
    use sea_orm::{DbErr, MockDatabase};

    fn alice() -> Voter {
        Voter {
            id: "alice".to_string(),
            username: "alice".to_string(),
        }
    }

    fn ledger(mock: MockDatabase) -> VoteLedgerService {
        VoteLedgerService::new(CaptionVoteRepository::new(into_shared(mock)))
    }

    #[tokio::test]
    async fn test_anonymous_vote_is_rejected() {
        let ledger = ledger(mock_db());

        let result = ledger.submit_vote(None, "c1", VoteValue::Up).await;

        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_first_vote_inserts() {
        let ledger = ledger(
            mock_db()
                .append_query_results([Vec::<caption_vote::Model>::new()])
                .append_query_results([[vote_fixture("v1", "alice", "c1", 1)]]),
        );

        let state = ledger
            .submit_vote(Some(&alice()), "c1", VoteValue::Up)
            .await
            .unwrap();

        assert_eq!(state, VoteState::Up);
    }

    #[tokio::test]
    async fn test_same_vote_deletes() {
        let ledger = ledger(
            mock_db()
                .append_query_results([[vote_fixture("v1", "alice", "c1", 1)]])
                .append_exec_results([one_row_affected()]),
        );

        let state = ledger
            .submit_vote(Some(&alice()), "c1", VoteValue::Up)
            .await
            .unwrap();

        assert_eq!(state, VoteState::None);
    }

    #[tokio::test]
    async fn test_opposite_vote_updates_in_place() {
        let mut updated = vote_fixture("v1", "alice", "c1", -1);
        updated.modified_at = Some(Utc::now().into());
        let ledger = ledger(
            mock_db()
                .append_query_results([[vote_fixture("v1", "alice", "c1", 1)]])
                .append_query_results([[updated]]),
        );

        let state = ledger
            .submit_vote(Some(&alice()), "c1", VoteValue::Down)
            .await
            .unwrap();

        assert_eq!(state, VoteState::Down);
    }

    #[tokio::test]
    async fn test_store_error_surfaces_as_persistence() {
        let ledger = ledger(
            mock_db().append_query_errors([DbErr::Custom(
                "insert or update on table \"caption_vote\" violates foreign key constraint"
                    .to_string(),
            )]),
        );

        let result = ledger.submit_vote(Some(&alice()), "ghost", VoteValue::Up).await;

        match result {
            Err(AppError::Persistence(message)) => assert!(message.contains("foreign key")),
            other => panic!("expected persistence error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_invalidates_cached_tally() {
        let cache = TallyCache::new();
        let (_, misses) = cache.get_many(&["c1".to_string()]).await;
        cache
            .fill(
                &misses,
                &[("c1".to_string(), AggregateCount::new(1, 0))]
                    .into_iter()
                    .collect(),
            )
            .await;
        let ledger = VoteLedgerService::with_invalidator(
            CaptionVoteRepository::new(into_shared(
                mock_db()
                    .append_query_results([[vote_fixture("v1", "alice", "c1", 1)]])
                    .append_exec_results([one_row_affected()]),
            )),
            Arc::new(cache.clone()),
        );

        ledger
            .submit_vote(Some(&alice()), "c1", VoteValue::Up)
            .await
            .unwrap();

        assert!(cache.get("c1").await.is_none());
    }

    struct FailingInvalidator;

    #[async_trait]
    impl ViewInvalidator for FailingInvalidator {
        async fn invalidate_caption(&self, _caption_id: &str) -> AppResult<()> {
            Err(AppError::Internal("cache offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_invalidation_failure_does_not_fail_vote() {
        let ledger = VoteLedgerService::with_invalidator(
            CaptionVoteRepository::new(into_shared(
                mock_db()
                    .append_query_results([Vec::<caption_vote::Model>::new()])
                    .append_query_results([[vote_fixture("v1", "alice", "c1", -1)]]),
            )),
            Arc::new(FailingInvalidator),
        );

        let state = ledger
            .submit_vote(Some(&alice()), "c1", VoteValue::Down)
            .await
            .unwrap();

        assert_eq!(state, VoteState::Down);
    }

    #[tokio::test]
    async fn test_restore_to_current_state_is_a_no_op() {
        // a second query would fail: no further results are queued
        let ledger = ledger(
            mock_db().append_query_results([[vote_fixture("v1", "alice", "c1", 1)]]),
        );

        let state = ledger
            .restore_vote(Some(&alice()), "c1", VoteState::Up)
            .await
            .unwrap();

        assert_eq!(state, VoteState::Up);
    }

    #[tokio::test]
    async fn test_voter_votes_skips_malformed_rows() {
        let ledger = ledger(mock_db().append_query_results([[
            vote_fixture("v3", "alice", "c3", 1),
            vote_fixture("v2", "alice", "c2", 0),
            vote_fixture("v1", "alice", "c1", -1),
        ]]));

        let votes = ledger.voter_votes(&alice()).await.unwrap();

        assert_eq!(votes.len(), 2);
        assert_eq!(votes.get("c3"), Some(&VoteState::Up));
        assert_eq!(votes.get("c1"), Some(&VoteState::Down));
    }

    #[tokio::test]
    async fn test_caption_tally_counts_live_rows() {
        let ledger = ledger(mock_db().append_query_results([[
            vote_fixture("v1", "alice", "c1", 1),
            vote_fixture("v2", "bob", "c1", 1),
            vote_fixture("v3", "carol", "c1", -1),
        ]]));

        let tally = ledger.caption_tally("c1").await.unwrap();

        assert_eq!(tally, AggregateCount::new(2, 1));
        assert_eq!(tally.score(), 1);
    }

    #[tokio::test]
    async fn test_optimistic_store_over_ledger_rolls_back_anonymous_vote() {
        let submitter = LedgerSubmitter::new(ledger(mock_db()), None);
        let store = OptimisticVoteStore::new(Arc::new(submitter));
        store.seed("c1", LocalVote::new(VoteState::None, AggregateCount::new(2, 0)));

        let outcome = store.apply_vote("c1", VoteValue::Up).await;

        assert!(!outcome.is_confirmed());
        assert_eq!(store.get("c1").counts, AggregateCount::new(2, 0));
    }
}
