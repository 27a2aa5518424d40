//! Core voting, pairing and ranking logic for caption-battle.
//!
//! - [`vote`]: tri-state vote values and aggregate counts
//! - [`optimistic`]: client-held mirror with optimistic updates and rollback
//! - [`pairing`]: battle pair and single-caption queue generation
//! - [`ranking`]: scores, leaderboard and feed views
//! - [`session`]: progress tracking, comparison recording, battle sessions
//! - [`services`]: ledger, catalog and identity services over the database

pub mod model;
pub mod optimistic;
pub mod pairing;
pub mod ranking;
pub mod services;
pub mod session;
pub mod upload;
pub mod vote;

#[cfg(test)]
mod test_support;

pub use model::{Caption, CaptionEntry, Image, ImageGroup};
pub use optimistic::{LocalVote, OptimisticVoteStore, PendingVote, VoteOutcome, VoteSubmitter};
pub use pairing::{BattlePair, PairGenerator, SingleBattle};
pub use ranking::{Baseline, FeedQuery, FeedSort, LeaderboardEntry, RankingEngine, VoteView};
pub use services::*;
pub use session::{
    BattleDeck, BattleItem, BattleSession, ComparisonOutcome, ComparisonRecorder, Pick,
    SessionProgressTracker,
};
pub use vote::{AggregateCount, VoteState, VoteValue};
