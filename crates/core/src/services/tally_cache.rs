//! Cached per-caption vote tallies.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use captionbattle_common::AppResult;
use tokio::sync::RwLock;
use tracing::debug;

use crate::vote::AggregateCount;

/// Drops cached aggregate views after a vote mutation.
#[async_trait]
pub trait ViewInvalidator: Send + Sync {
    /// Forget anything cached for `caption_id`.
    async fn invalidate_caption(&self, caption_id: &str) -> AppResult<()>;
}

/// Type alias for a shared invalidator.
pub type ViewInvalidatorService = Arc<dyn ViewInvalidator>;

/// Invalidator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpInvalidator;

#[async_trait]
impl ViewInvalidator for NoOpInvalidator {
    async fn invalidate_caption(&self, _caption_id: &str) -> AppResult<()> {
        Ok(())
    }
}

/// A cache miss, remembering the caption's generation at lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyMiss {
    caption_id: String,
    generation: u64,
}

impl TallyMiss {
    #[must_use]
    pub fn caption_id(&self) -> &str {
        &self.caption_id
    }
}

#[derive(Debug, Default)]
struct CacheState {
    tallies: HashMap<String, AggregateCount>,
    /// Bumped on every invalidation; never removed.
    generations: HashMap<String, u64>,
}

impl CacheState {
    fn generation(&self, caption_id: &str) -> u64 {
        self.generations.get(caption_id).copied().unwrap_or_default()
    }
}

/// In-process cache of caption tallies, shared by the catalog and the ledger.
///
/// A tally computed from a miss is only stored if the caption was not
/// invalidated since the miss was observed.
#[derive(Debug, Clone, Default)]
pub struct TallyCache {
    state: Arc<RwLock<CacheState>>,
}

impl TallyCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tally for one caption.
    pub async fn get(&self, caption_id: &str) -> Option<AggregateCount> {
        self.state.read().await.tallies.get(caption_id).copied()
    }

    /// Split `caption_ids` into cached tallies and the misses to fill.
    pub async fn get_many(
        &self,
        caption_ids: &[String],
    ) -> (HashMap<String, AggregateCount>, Vec<TallyMiss>) {
        let state = self.state.read().await;
        let mut hits = HashMap::with_capacity(caption_ids.len());
        let mut misses = Vec::new();

        for id in caption_ids {
            match state.tallies.get(id) {
                Some(count) => {
                    hits.insert(id.clone(), *count);
                }
                None => misses.push(TallyMiss {
                    caption_id: id.clone(),
                    generation: state.generation(id),
                }),
            }
        }

        (hits, misses)
    }

    /// Store tallies computed for `misses`.
    ///
    /// Captions invalidated after their miss was observed are skipped. Returns
    /// the number of entries stored.
    pub async fn fill(
        &self,
        misses: &[TallyMiss],
        fresh: &HashMap<String, AggregateCount>,
    ) -> usize {
        let mut state = self.state.write().await;
        let mut stored = 0;

        for miss in misses {
            if state.generation(&miss.caption_id) != miss.generation {
                debug!(caption_id = %miss.caption_id, "Skipped stale tally");
                continue;
            }
            let count = fresh.get(&miss.caption_id).copied().unwrap_or_default();
            state.tallies.insert(miss.caption_id.clone(), count);
            stored += 1;
        }

        stored
    }
}

#[async_trait]
impl ViewInvalidator for TallyCache {
    async fn invalidate_caption(&self, caption_id: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        *state.generations.entry(caption_id.to_string()).or_default() += 1;
        if state.tallies.remove(caption_id).is_some() {
            debug!(caption_id = %caption_id, "Invalidated cached tally");
        }
        Ok(())
    }
}
