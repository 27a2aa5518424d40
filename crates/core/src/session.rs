//! Session progress, comparison recording and the battle session object.

use std::sync::Arc;
use std::time::Duration;

use captionbattle_common::{AppError, AppResult, BattleConfig, IdGenerator, PartialFailurePolicy};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::model::ImageGroup;
use crate::optimistic::{LocalVote, OptimisticVoteStore, PendingVote, VoteOutcome};
use crate::pairing::{BattlePair, PairGenerator, SingleBattle};
use crate::vote::VoteValue;

/// Proof that a judgment was accepted at a given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgmentTicket {
    index: usize,
    generation: u64,
}

impl JudgmentTicket {
    /// Position the judgment was made at.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// Position and judged count within one sitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgressTracker {
    len: usize,
    index: usize,
    judged: usize,
    pending: Option<JudgmentTicket>,
    generation: u64,
}

impl SessionProgressTracker {
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self {
            len,
            index: 0,
            judged: 0,
            pending: None,
            generation: 0,
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn judged(&self) -> usize {
        self.judged
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.index >= self.len
    }

    /// Whether a judgment is waiting for its advance.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Share of the sequence already passed, 0 for an empty sequence.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        self.index.min(self.len) as f64 / self.len as f64 * 100.0
    }

    /// Accept a judgment at the current index.
    ///
    /// Returns `None` while another judgment is pending or once complete.
    pub fn begin_judgment(&mut self) -> Option<JudgmentTicket> {
        if self.pending.is_some() || self.is_complete() {
            return None;
        }
        let ticket = JudgmentTicket {
            index: self.index,
            generation: self.generation,
        };
        self.judged += 1;
        self.pending = Some(ticket);
        Some(ticket)
    }

    /// Move past the judged index. Repeated or stale tickets are ignored.
    pub fn advance(&mut self, ticket: JudgmentTicket) -> bool {
        if self.pending != Some(ticket) {
            return false;
        }
        self.pending = None;
        self.index += 1;
        true
    }

    /// Back to the first item; tickets issued before the restart become stale.
    pub fn restart(&mut self) {
        self.index = 0;
        self.judged = 0;
        self.pending = None;
        self.generation += 1;
    }
}

/// Which caption of a pair won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pick {
    A,
    B,
}

/// Both halves of a comparison, applied locally but not yet submitted.
#[derive(Debug)]
pub struct PendingComparison {
    winner: PendingVote,
    loser: PendingVote,
}

/// How a comparison settled.
#[derive(Debug)]
pub struct ComparisonOutcome {
    pub winner: VoteOutcome,
    pub loser: VoteOutcome,
    /// Restore issued for the half that persisted alone, if any.
    pub compensation: Option<VoteOutcome>,
}

impl ComparisonOutcome {
    /// Both halves persisted.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        self.winner.is_confirmed() && self.loser.is_confirmed()
    }
}

/// Turns a two-caption decision into an up vote and a down vote.
#[derive(Debug, Clone)]
pub struct ComparisonRecorder {
    store: OptimisticVoteStore,
    policy: PartialFailurePolicy,
}

impl ComparisonRecorder {
    pub const fn new(store: OptimisticVoteStore, policy: PartialFailurePolicy) -> Self {
        Self { store, policy }
    }

    /// Apply both halves to the local mirror.
    pub fn start(&self, winner_id: &str, loser_id: &str) -> PendingComparison {
        PendingComparison {
            winner: self.store.begin(winner_id, VoteValue::Up),
            loser: self.store.begin(loser_id, VoteValue::Down),
        }
    }

    /// Submit both halves concurrently and apply the partial failure policy.
    pub async fn finish(&self, pending: PendingComparison) -> ComparisonOutcome {
        let (winner, loser) = futures::join!(
            self.store.complete(pending.winner),
            self.store.complete(pending.loser)
        );

        let survivor = match (winner.is_confirmed(), loser.is_confirmed()) {
            (true, false) => Some(&winner),
            (false, true) => Some(&loser),
            _ => None,
        };

        let compensation = match (survivor, self.policy) {
            (Some(survivor), PartialFailurePolicy::Compensate) => {
                let caption_id = survivor.caption_id().to_string();
                let target = survivor.previous().vote;
                warn!(
                    caption_id = %caption_id,
                    restore_to = target.as_i16(),
                    "Comparison half-applied, restoring persisted side"
                );
                Some(self.store.restore(&caption_id, target).await)
            }
            (Some(survivor), PartialFailurePolicy::Tolerate) => {
                debug!(
                    caption_id = %survivor.caption_id(),
                    "Comparison half-applied, keeping persisted side"
                );
                None
            }
            (None, _) => None,
        };

        ComparisonOutcome {
            winner,
            loser,
            compensation,
        }
    }

    /// Record a comparison end to end.
    pub async fn record_comparison(&self, winner_id: &str, loser_id: &str) -> ComparisonOutcome {
        let pending = self.start(winner_id, loser_id);
        self.finish(pending).await
    }
}

/// The shuffled sequence a session walks through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "items", rename_all = "lowercase")]
pub enum BattleDeck {
    Pairs(Vec<BattlePair>),
    Singles(Vec<SingleBattle>),
}

impl BattleDeck {
    /// Shuffled pairs for `seed`, capped at `max_pairs`.
    #[must_use]
    pub fn pairs(groups: &[ImageGroup], seed: u64, max_pairs: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::Pairs(PairGenerator::new(max_pairs).battle_pairs(groups, &mut rng))
    }

    /// Shuffled single captions for `seed`.
    #[must_use]
    pub fn singles(groups: &[ImageGroup], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::Singles(PairGenerator::single_queue(groups, &mut rng))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Pairs(pairs) => pairs.len(),
            Self::Singles(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<BattleItem<'_>> {
        match self {
            Self::Pairs(pairs) => pairs.get(index).map(BattleItem::Pair),
            Self::Singles(items) => items.get(index).map(BattleItem::Single),
        }
    }
}

/// One item of a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleItem<'a> {
    Pair(&'a BattlePair),
    Single(&'a SingleBattle),
}

impl BattleItem<'_> {
    /// Image to show (or preload) for this item.
    #[must_use]
    pub fn image_url(&self) -> &str {
        match self {
            Self::Pair(pair) => &pair.image_url,
            Self::Single(single) => &single.image_url,
        }
    }
}

/// Handles for an accepted judgment.
#[derive(Debug)]
pub struct Judged<T> {
    /// Local state right after the judgment.
    pub local: Vec<LocalVote>,
    /// Settles once the ledger answered.
    pub outcome: JoinHandle<T>,
    /// Settles once the session moved on; `false` if the advance was stale.
    pub advance: JoinHandle<bool>,
}

/// A seeded battle or feed game for one viewer.
///
/// The deck is shuffled once at construction and reused by [`restart`](Self::restart).
#[derive(Debug)]
pub struct BattleSession {
    seed: u64,
    deck: BattleDeck,
    tracker: Arc<Mutex<SessionProgressTracker>>,
    store: OptimisticVoteStore,
    recorder: ComparisonRecorder,
    advance_delay: Duration,
    can_vote: bool,
}

impl BattleSession {
    /// Two-caption session; a fresh seed is drawn when `seed` is `None`.
    pub fn pairs(
        groups: &[ImageGroup],
        seed: Option<u64>,
        store: OptimisticVoteStore,
        config: &BattleConfig,
    ) -> Self {
        let seed = seed.unwrap_or_else(|| IdGenerator::new().generate_seed());
        let deck = BattleDeck::pairs(groups, seed, config.max_pairs);
        Self::with_deck(seed, deck, store, config, config.battle_advance())
    }

    /// Single-caption feed game.
    pub fn singles(
        groups: &[ImageGroup],
        seed: Option<u64>,
        store: OptimisticVoteStore,
        config: &BattleConfig,
    ) -> Self {
        let seed = seed.unwrap_or_else(|| IdGenerator::new().generate_seed());
        let deck = BattleDeck::singles(groups, seed);
        Self::with_deck(seed, deck, store, config, config.feed_advance())
    }

    fn with_deck(
        seed: u64,
        deck: BattleDeck,
        store: OptimisticVoteStore,
        config: &BattleConfig,
        advance_delay: Duration,
    ) -> Self {
        debug!(seed, items = deck.len(), "Created battle session");
        Self {
            seed,
            tracker: Arc::new(Mutex::new(SessionProgressTracker::new(deck.len()))),
            recorder: ComparisonRecorder::new(store.clone(), config.partial_failure),
            deck,
            store,
            advance_delay,
            can_vote: true,
        }
    }

    /// Browse without voting; judgments fail with `Unauthenticated`.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.can_vote = false;
        self
    }

    /// Override the advance delay.
    #[must_use]
    pub const fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn deck(&self) -> &BattleDeck {
        &self.deck
    }

    #[must_use]
    pub const fn store(&self) -> &OptimisticVoteStore {
        &self.store
    }

    #[must_use]
    pub fn current(&self) -> Option<BattleItem<'_>> {
        self.deck.get(self.tracker.lock().index())
    }

    /// The item after the current one, for preloading its image.
    #[must_use]
    pub fn peek_next(&self) -> Option<BattleItem<'_>> {
        self.deck.get(self.tracker.lock().index() + 1)
    }

    #[must_use]
    pub fn judged(&self) -> usize {
        self.tracker.lock().judged()
    }

    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        self.tracker.lock().progress_percent()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tracker.lock().is_complete()
    }

    /// Replay the same order from the start.
    pub fn restart(&self) {
        self.tracker.lock().restart();
    }

    /// Judge the current pair.
    ///
    /// Returns `Ok(None)` when a judgment is already pending or the session is over.
    /// Must be called from within a tokio runtime.
    pub fn pick(&self, pick: Pick) -> AppResult<Option<Judged<ComparisonOutcome>>> {
        if !self.can_vote {
            return Err(AppError::Unauthenticated);
        }
        let BattleDeck::Pairs(pairs) = &self.deck else {
            return Err(AppError::Validation(
                "pick needs a two-caption session".to_string(),
            ));
        };

        let Some(ticket) = self.tracker.lock().begin_judgment() else {
            return Ok(None);
        };
        let Some(pair) = pairs.get(ticket.index()) else {
            return Ok(None);
        };

        let (winner, loser) = match pick {
            Pick::A => (&pair.caption_a, &pair.caption_b),
            Pick::B => (&pair.caption_b, &pair.caption_a),
        };

        let pending = self.recorder.start(&winner.id, &loser.id);
        let local = vec![pending.winner.current, pending.loser.current];
        let recorder = self.recorder.clone();
        let outcome = tokio::spawn(async move { recorder.finish(pending).await });

        Ok(Some(Judged {
            local,
            outcome,
            advance: self.schedule_advance(ticket),
        }))
    }

    /// Vote on the current single caption.
    ///
    /// Must be called from within a tokio runtime.
    pub fn vote(&self, value: VoteValue) -> AppResult<Option<Judged<VoteOutcome>>> {
        if !self.can_vote {
            return Err(AppError::Unauthenticated);
        }
        let BattleDeck::Singles(items) = &self.deck else {
            return Err(AppError::Validation(
                "vote needs a single-caption session".to_string(),
            ));
        };

        let Some(ticket) = self.tracker.lock().begin_judgment() else {
            return Ok(None);
        };
        let Some(item) = items.get(ticket.index()) else {
            return Ok(None);
        };

        let pending = self.store.begin(&item.caption.id, value);
        let local = vec![pending.current];
        let store = self.store.clone();
        let outcome = tokio::spawn(async move { store.complete(pending).await });

        Ok(Some(Judged {
            local,
            outcome,
            advance: self.schedule_advance(ticket),
        }))
    }

    fn schedule_advance(&self, ticket: JudgmentTicket) -> JoinHandle<bool> {
        let tracker = self.tracker.clone();
        let delay = self.advance_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracker.lock().advance(ticket)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Caption, CaptionEntry, Image};
    use crate::test_support::MemorySubmitter;
    use crate::vote::{AggregateCount, VoteState};

    fn groups() -> Vec<ImageGroup> {
        let image = Image {
            id: "img".to_string(),
            url: "https://cdn.example.com/img.jpg".to_string(),
        };
        let captions = ["a", "b", "c"]
            .iter()
            .map(|id| {
                CaptionEntry::unvoted(Caption {
                    id: (*id).to_string(),
                    image_id: "img".to_string(),
                    content: format!("caption {id}"),
                })
            })
            .collect();
        vec![ImageGroup { image, captions }]
    }

    fn store(submitter: &Arc<MemorySubmitter>) -> OptimisticVoteStore {
        OptimisticVoteStore::new(submitter.clone())
    }

    #[test]
    fn test_tracker_guards_duplicate_judgment_and_advance() {
        let mut tracker = SessionProgressTracker::new(2);

        let ticket = tracker.begin_judgment().unwrap();
        assert!(tracker.begin_judgment().is_none());
        assert_eq!(tracker.judged(), 1);

        assert!(tracker.advance(ticket));
        assert!(!tracker.advance(ticket));
        assert_eq!(tracker.index(), 1);
        assert!((tracker.progress_percent() - 50.0).abs() < f64::EPSILON);

        let ticket = tracker.begin_judgment().unwrap();
        assert!(tracker.advance(ticket));
        assert!(tracker.is_complete());
        assert!(tracker.begin_judgment().is_none());
        assert_eq!(tracker.judged(), 2);
    }

    #[test]
    fn test_tracker_restart_makes_old_tickets_stale() {
        let mut tracker = SessionProgressTracker::new(3);
        let stale = tracker.begin_judgment().unwrap();

        tracker.restart();
        let fresh = tracker.begin_judgment().unwrap();

        assert!(!tracker.advance(stale));
        assert!(tracker.is_pending());
        assert!(tracker.advance(fresh));
        assert!(!tracker.is_pending());
        assert_eq!(tracker.index(), 1);
    }

    #[test]
    fn test_tracker_empty_sequence() {
        let tracker = SessionProgressTracker::new(0);
        assert!(tracker.is_complete());
        assert!(tracker.progress_percent().abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_comparison_votes_winner_up_loser_down() {
        let submitter = Arc::new(MemorySubmitter::default());
        let recorder = ComparisonRecorder::new(store(&submitter), PartialFailurePolicy::Compensate);

        let outcome = recorder.record_comparison("a", "b").await;

        assert!(outcome.is_applied());
        assert!(outcome.compensation.is_none());
        assert_eq!(submitter.state("a"), VoteState::Up);
        assert_eq!(submitter.state("b"), VoteState::Down);
    }

    #[tokio::test]
    async fn test_comparison_compensates_half_applied() {
        let submitter = Arc::new(MemorySubmitter::default());
        submitter.fail_caption("b");
        let store = store(&submitter);
        let recorder = ComparisonRecorder::new(store.clone(), PartialFailurePolicy::Compensate);

        let outcome = recorder.record_comparison("a", "b").await;

        assert!(!outcome.is_applied());
        assert!(outcome.compensation.as_ref().unwrap().is_confirmed());
        assert_eq!(submitter.state("a"), VoteState::None);
        assert_eq!(store.get("a"), LocalVote::default());
        assert_eq!(store.get("b"), LocalVote::default());
        assert_eq!(submitter.calls().last().unwrap(), "restore:a");
    }

    #[tokio::test]
    async fn test_comparison_tolerates_half_applied() {
        let submitter = Arc::new(MemorySubmitter::default());
        submitter.fail_caption("b");
        let store = store(&submitter);
        let recorder = ComparisonRecorder::new(store.clone(), PartialFailurePolicy::Tolerate);

        let outcome = recorder.record_comparison("a", "b").await;

        assert!(outcome.compensation.is_none());
        assert_eq!(submitter.state("a"), VoteState::Up);
        assert_eq!(store.get("a").counts, AggregateCount::new(1, 0));
        assert_eq!(store.get("b"), LocalVote::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_pick_advances_after_delay() {
        let submitter = Arc::new(MemorySubmitter::default());
        let session =
            BattleSession::pairs(&groups(), Some(7), store(&submitter), &BattleConfig::default());
        assert_eq!(session.deck().len(), 3);

        let Some(BattleItem::Pair(pair)) = session.current() else {
            panic!("expected a pair");
        };
        let winner_id = pair.caption_a.id.clone();
        let next_url = session.peek_next().map(|item| item.image_url().to_string());
        assert_eq!(next_url.as_deref(), Some("https://cdn.example.com/img.jpg"));

        let judged = session.pick(Pick::A).unwrap().unwrap();
        assert!(session.pick(Pick::B).unwrap().is_none());
        assert_eq!(judged.local[0].vote, VoteState::Up);
        assert_eq!(judged.local[1].vote, VoteState::Down);

        assert!(judged.outcome.await.unwrap().is_applied());
        assert!(judged.advance.await.unwrap());
        assert_eq!(session.judged(), 1);
        assert_eq!(submitter.state(&winner_id), VoteState::Up);
        assert!((session.progress_percent() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_runs_to_completion_and_restarts_in_same_order() {
        let submitter = Arc::new(MemorySubmitter::default());
        let session =
            BattleSession::pairs(&groups(), None, store(&submitter), &BattleConfig::default())
                .with_advance_delay(Duration::ZERO);
        let order = session.deck().clone();

        while !session.is_complete() {
            let judged = session.pick(Pick::B).unwrap().unwrap();
            judged.outcome.await.unwrap();
            judged.advance.await.unwrap();
        }
        assert_eq!(session.judged(), 3);
        assert!(session.current().is_none());
        assert!(session.pick(Pick::A).unwrap().is_none());

        session.restart();
        assert_eq!(session.judged(), 0);
        assert!(!session.is_complete());
        assert_eq!(session.deck(), &order);
    }

    #[tokio::test]
    async fn test_same_seed_same_deck() {
        let submitter = Arc::new(MemorySubmitter::default());
        let config = BattleConfig::default();
        let a = BattleSession::singles(&groups(), Some(42), store(&submitter), &config);
        let b = BattleSession::singles(&groups(), Some(42), store(&submitter), &config);
        assert_eq!(a.deck(), b.deck());
        assert_eq!(a.deck(), &BattleDeck::singles(&groups(), 42));
        assert_eq!(a.seed(), 42);

        let pairs = BattleSession::pairs(&groups(), Some(42), store(&submitter), &config);
        assert_eq!(pairs.deck(), &BattleDeck::pairs(&groups(), 42, config.max_pairs));
    }

    #[tokio::test(start_paused = true)]
    async fn test_singles_vote_and_mode_mismatch() {
        let submitter = Arc::new(MemorySubmitter::default());
        let session =
            BattleSession::singles(&groups(), Some(1), store(&submitter), &BattleConfig::default());

        assert!(matches!(session.pick(Pick::A), Err(AppError::Validation(_))));

        let judged = session.vote(VoteValue::Up).unwrap().unwrap();
        assert!(judged.outcome.await.unwrap().is_confirmed());
        assert!(judged.advance.await.unwrap());
        assert_eq!(session.judged(), 1);
    }

    #[tokio::test]
    async fn test_read_only_session_refuses_judgments() {
        let submitter = Arc::new(MemorySubmitter::default());
        let session =
            BattleSession::pairs(&groups(), Some(3), store(&submitter), &BattleConfig::default())
                .read_only();

        assert!(matches!(session.pick(Pick::A), Err(AppError::Unauthenticated)));
        assert_eq!(session.judged(), 0);
        assert!(submitter.calls().is_empty());
    }
}
