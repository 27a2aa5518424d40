//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use captionbattle_common::{AppError, AppResult};
use parking_lot::Mutex;

use crate::optimistic::VoteSubmitter;
use crate::vote::{VoteState, VoteValue};

/// A ledger held in a map, with per-caption failure injection.
#[derive(Debug, Default)]
pub struct MemorySubmitter {
    votes: Mutex<HashMap<String, VoteState>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MemorySubmitter {
    pub fn fail_caption(&self, caption_id: &str) {
        self.failing.lock().insert(caption_id.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    pub fn set_state(&self, caption_id: &str, state: VoteState) {
        self.votes.lock().insert(caption_id.to_string(), state);
    }

    pub fn state(&self, caption_id: &str) -> VoteState {
        self.votes
            .lock()
            .get(caption_id)
            .copied()
            .unwrap_or_default()
    }

    /// Every call in order, as `"submit:<id>"` or `"restore:<id>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn check(&self, caption_id: &str) -> AppResult<()> {
        if self.failing.lock().contains(caption_id) {
            return Err(AppError::Persistence(format!(
                "connection reset while writing {caption_id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VoteSubmitter for MemorySubmitter {
    async fn submit_vote(&self, caption_id: &str, value: VoteValue) -> AppResult<VoteState> {
        self.calls.lock().push(format!("submit:{caption_id}"));
        self.check(caption_id)?;
        let mut votes = self.votes.lock();
        let next = votes.get(caption_id).copied().unwrap_or_default().toggle(value);
        votes.insert(caption_id.to_string(), next);
        Ok(next)
    }

    async fn restore_vote(&self, caption_id: &str, state: VoteState) -> AppResult<VoteState> {
        self.calls.lock().push(format!("restore:{caption_id}"));
        self.check(caption_id)?;
        self.votes.lock().insert(caption_id.to_string(), state);
        Ok(state)
    }
}
