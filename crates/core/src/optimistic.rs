//! Client-held mirror of vote state with optimistic updates and rollback.
//!
//! Every intent is applied to the local mirror synchronously and forwarded to a
//! [`VoteSubmitter`]. The mirror keeps the last state the ledger confirmed plus
//! the queue of intents still in flight; the displayed state is the in-flight
//! queue folded over the confirmed state, so a second vote on the same caption
//! always builds on the first one's local result and counts are never doubled.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use captionbattle_common::{AppError, AppResult};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::model::{CaptionEntry, ImageGroup};
use crate::ranking::VoteView;
use crate::vote::{AggregateCount, VoteState, VoteValue};

/// Transport from the optimistic store to the durable vote ledger.
#[async_trait]
pub trait VoteSubmitter: Send + Sync {
    /// Toggle a vote and return the resulting durable state.
    async fn submit_vote(&self, caption_id: &str, value: VoteValue) -> AppResult<VoteState>;

    /// Force the durable state of a caption vote.
    async fn restore_vote(&self, caption_id: &str, state: VoteState) -> AppResult<VoteState>;
}

/// The viewer's vote on one caption together with the caption's counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVote {
    pub vote: VoteState,
    pub counts: AggregateCount,
}

impl LocalVote {
    #[must_use]
    pub const fn new(vote: VoteState, counts: AggregateCount) -> Self {
        Self { vote, counts }
    }

    /// Move to `next`, adjusting counts by the transition delta.
    #[must_use]
    pub const fn moved_to(self, next: VoteState) -> Self {
        Self {
            vote: next,
            counts: self.counts.transition(self.vote, next),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Toggle(VoteValue),
    Set(VoteState),
}

impl Intent {
    const fn apply(self, vote: VoteState) -> VoteState {
        match self {
            Self::Toggle(value) => vote.toggle(value),
            Self::Set(state) => state,
        }
    }
}

#[derive(Debug, Default)]
struct Mirror {
    confirmed: LocalVote,
    confirmed_seq: u64,
    in_flight: VecDeque<(u64, Intent)>,
}

impl Mirror {
    fn displayed(&self) -> LocalVote {
        self.in_flight
            .iter()
            .fold(self.confirmed, |local, (_, intent)| {
                local.moved_to(intent.apply(local.vote))
            })
    }
}

#[derive(Debug, Default)]
struct MirrorTable {
    entries: HashMap<String, Mirror>,
    next_seq: u64,
}

/// A locally applied intent awaiting its ledger result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending vote must be completed or the local change is never confirmed"]
pub struct PendingVote {
    caption_id: String,
    seq: u64,
    intent: Intent,
    /// Local state before the intent.
    pub previous: LocalVote,
    /// Local state right after the intent.
    pub current: LocalVote,
}

impl PendingVote {
    /// Caption the intent targets.
    #[must_use]
    pub fn caption_id(&self) -> &str {
        &self.caption_id
    }
}

/// How a submitted intent ended.
#[derive(Debug)]
pub enum VoteOutcome {
    /// The ledger accepted the intent.
    Confirmed {
        caption_id: String,
        previous: LocalVote,
        current: LocalVote,
    },
    /// The ledger rejected the intent and the local change was undone.
    RolledBack {
        caption_id: String,
        previous: LocalVote,
        current: LocalVote,
        error: AppError,
    },
}

impl VoteOutcome {
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    #[must_use]
    pub fn caption_id(&self) -> &str {
        match self {
            Self::Confirmed { caption_id, .. } | Self::RolledBack { caption_id, .. } => caption_id,
        }
    }

    /// Local state before the intent was applied.
    #[must_use]
    pub const fn previous(&self) -> LocalVote {
        match self {
            Self::Confirmed { previous, .. } | Self::RolledBack { previous, .. } => *previous,
        }
    }

    /// Local state after the outcome settled.
    #[must_use]
    pub const fn current(&self) -> LocalVote {
        match self {
            Self::Confirmed { current, .. } | Self::RolledBack { current, .. } => *current,
        }
    }
}

/// Optimistic vote store shared by one viewer's session.
///
/// Cloning is cheap; clones share the same mirror.
#[derive(Clone)]
pub struct OptimisticVoteStore {
    table: Arc<Mutex<MirrorTable>>,
    submitter: Arc<dyn VoteSubmitter>,
}

impl std::fmt::Debug for OptimisticVoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticVoteStore")
            .field("captions", &self.table.lock().entries.len())
            .finish_non_exhaustive()
    }
}

impl OptimisticVoteStore {
    /// Create an empty store forwarding to `submitter`.
    pub fn new(submitter: Arc<dyn VoteSubmitter>) -> Self {
        Self {
            table: Arc::new(Mutex::new(MirrorTable::default())),
            submitter,
        }
    }

    /// Seed the confirmed state of one caption. In-flight intents are kept.
    pub fn seed(&self, caption_id: impl Into<String>, local: LocalVote) {
        let mut table = self.table.lock();
        table.entries.entry(caption_id.into()).or_default().confirmed = local;
    }

    /// Seed every caption of `groups` from its baseline counts and own vote.
    pub fn seed_from_groups(&self, groups: &[ImageGroup]) {
        let mut table = self.table.lock();
        for entry in groups.iter().flat_map(|group| group.captions.iter()) {
            table
                .entries
                .entry(entry.caption.id.clone())
                .or_default()
                .confirmed = LocalVote::new(entry.my_vote, entry.counts);
        }
    }

    /// Displayed state of a caption, if the store knows it.
    #[must_use]
    pub fn snapshot(&self, caption_id: &str) -> Option<LocalVote> {
        self.table
            .lock()
            .entries
            .get(caption_id)
            .map(Mirror::displayed)
    }

    /// Displayed state of a caption, empty when unknown.
    #[must_use]
    pub fn get(&self, caption_id: &str) -> LocalVote {
        self.snapshot(caption_id).unwrap_or_default()
    }

    /// Net score under the displayed counts.
    #[must_use]
    pub fn score(&self, caption_id: &str) -> i64 {
        self.get(caption_id).counts.score()
    }

    /// Whether the caption has intents awaiting the ledger.
    #[must_use]
    pub fn has_pending(&self, caption_id: &str) -> bool {
        self.table
            .lock()
            .entries
            .get(caption_id)
            .is_some_and(|mirror| !mirror.in_flight.is_empty())
    }

    /// Apply a toggle intent locally without submitting it.
    pub fn begin(&self, caption_id: &str, value: VoteValue) -> PendingVote {
        self.push(caption_id, Intent::Toggle(value))
    }

    /// Apply an explicit state locally without submitting it.
    pub fn begin_restore(&self, caption_id: &str, state: VoteState) -> PendingVote {
        self.push(caption_id, Intent::Set(state))
    }

    fn push(&self, caption_id: &str, intent: Intent) -> PendingVote {
        let mut table = self.table.lock();
        table.next_seq += 1;
        let seq = table.next_seq;

        let mirror = table.entries.entry(caption_id.to_string()).or_default();
        let previous = mirror.displayed();
        mirror.in_flight.push_back((seq, intent));
        let current = previous.moved_to(intent.apply(previous.vote));

        PendingVote {
            caption_id: caption_id.to_string(),
            seq,
            intent,
            previous,
            current,
        }
    }

    /// Submit a pending intent and settle the mirror with the ledger's answer.
    ///
    /// Failures are swallowed: the intent is removed from the mirror and the
    /// error is returned inside [`VoteOutcome::RolledBack`].
    pub async fn complete(&self, pending: PendingVote) -> VoteOutcome {
        let result = match pending.intent {
            Intent::Toggle(value) => {
                self.submitter
                    .submit_vote(&pending.caption_id, value)
                    .await
            }
            Intent::Set(state) => {
                self.submitter
                    .restore_vote(&pending.caption_id, state)
                    .await
            }
        };

        let mut table = self.table.lock();
        let mirror = table.entries.entry(pending.caption_id.clone()).or_default();

        match result {
            Ok(state) => {
                if pending.seq > mirror.confirmed_seq {
                    mirror.confirmed = mirror.confirmed.moved_to(state);
                    mirror.confirmed_seq = pending.seq;
                    mirror.in_flight.retain(|(seq, _)| *seq > pending.seq);
                }
                let current = mirror.displayed();
                if state != pending.current.vote {
                    info!(
                        caption_id = %pending.caption_id,
                        expected = pending.current.vote.as_i16(),
                        actual = state.as_i16(),
                        "Reconciled local vote with ledger"
                    );
                }
                VoteOutcome::Confirmed {
                    caption_id: pending.caption_id,
                    previous: pending.previous,
                    current,
                }
            }
            Err(error) => {
                mirror.in_flight.retain(|(seq, _)| *seq != pending.seq);
                let current = mirror.displayed();
                debug!(
                    caption_id = %pending.caption_id,
                    error = %error,
                    "Vote submission failed, rolled back"
                );
                VoteOutcome::RolledBack {
                    caption_id: pending.caption_id,
                    previous: pending.previous,
                    current,
                    error,
                }
            }
        }
    }

    /// Toggle a vote locally and wait for the ledger.
    pub async fn apply_vote(&self, caption_id: &str, value: VoteValue) -> VoteOutcome {
        let pending = self.begin(caption_id, value);
        self.complete(pending).await
    }

    /// Toggle a vote locally and submit it in the background.
    ///
    /// Returns the local state right after the write. Must be called from
    /// within a tokio runtime.
    pub fn apply_vote_detached(&self, caption_id: &str, value: VoteValue) -> LocalVote {
        let pending = self.begin(caption_id, value);
        let current = pending.current;
        let store = self.clone();
        tokio::spawn(async move {
            store.complete(pending).await;
        });
        current
    }

    /// Force a caption back to `state` both locally and in the ledger.
    pub async fn restore(&self, caption_id: &str, state: VoteState) -> VoteOutcome {
        let pending = self.begin_restore(caption_id, state);
        self.complete(pending).await
    }
}

impl VoteView for OptimisticVoteStore {
    fn lookup(&self, entry: &CaptionEntry) -> (VoteState, AggregateCount) {
        self.snapshot(&entry.caption.id).map_or(
            (entry.my_vote, entry.counts),
            |local| (local.vote, local.counts),
        )
    }
}
