//! Scores, leaderboard and feed views.
//!
//! All views read counts through [`VoteView`], so the same code serves the
//! durable baseline and a viewer's optimistic mirror.

use serde::{Deserialize, Serialize};

use crate::model::{Caption, CaptionEntry, ImageGroup};
use crate::vote::{AggregateCount, VoteState};

/// Default leaderboard length.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 100;

/// Source of current counts and the viewer's own vote for a caption.
pub trait VoteView {
    /// Counts and own vote for `entry`, falling back to the entry's baseline.
    fn lookup(&self, entry: &CaptionEntry) -> (VoteState, AggregateCount);
}

/// Reads the baseline carried on each entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct Baseline;

impl VoteView for Baseline {
    fn lookup(&self, entry: &CaptionEntry) -> (VoteState, AggregateCount) {
        (entry.my_vote, entry.counts)
    }
}

/// Feed ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSort {
    /// Store order (newest image first).
    #[default]
    Newest,
    /// Highest caption score per image first.
    Top,
}

/// Feed filters, applied in the order search, unvoted, sort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: FeedSort,
    #[serde(default)]
    pub unvoted_only: bool,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    pub caption: Caption,
    pub image_url: String,
    pub counts: AggregateCount,
    pub score: i64,
}

/// Computes scores and ranked views.
#[derive(Debug, Clone, Copy)]
pub struct RankingEngine {
    leaderboard_size: usize,
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_LEADERBOARD_SIZE)
    }
}

impl RankingEngine {
    /// Create an engine with the given leaderboard length.
    #[must_use]
    pub const fn new(leaderboard_size: usize) -> Self {
        Self { leaderboard_size }
    }

    /// Net score of a caption under `view`.
    pub fn score<V: VoteView + ?Sized>(view: &V, entry: &CaptionEntry) -> i64 {
        view.lookup(entry).1.score()
    }

    /// Every caption across all groups, by score descending, ties in encounter order.
    pub fn leaderboard<V: VoteView + ?Sized>(
        &self,
        groups: &[ImageGroup],
        view: &V,
    ) -> Vec<LeaderboardEntry> {
        let mut rows: Vec<(i64, AggregateCount, &CaptionEntry, &str)> = groups
            .iter()
            .flat_map(|group| {
                group.captions.iter().map(move |entry| {
                    let (_, counts) = view.lookup(entry);
                    (counts.score(), counts, entry, group.image.url.as_str())
                })
            })
            .collect();

        // sort_by is stable, so equal scores keep encounter order
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.truncate(self.leaderboard_size);

        rows.into_iter()
            .enumerate()
            .map(|(i, (score, counts, entry, image_url))| LeaderboardEntry {
                rank: i + 1,
                caption: entry.caption.clone(),
                image_url: image_url.to_string(),
                counts,
                score,
            })
            .collect()
    }

    /// Groups by their best caption score descending, ties in original order.
    pub fn sort_top<V: VoteView + ?Sized>(
        mut groups: Vec<ImageGroup>,
        view: &V,
    ) -> Vec<ImageGroup> {
        groups.sort_by_cached_key(|group| {
            let best = group
                .captions
                .iter()
                .map(|entry| Self::score(view, entry))
                .max()
                .unwrap_or(i64::MIN);
            std::cmp::Reverse(best)
        });
        groups
    }

    /// Groups with at least one caption the viewer has not voted on.
    pub fn filter_unvoted<V: VoteView + ?Sized>(
        groups: Vec<ImageGroup>,
        view: &V,
    ) -> Vec<ImageGroup> {
        groups
            .into_iter()
            .filter(|group| {
                group
                    .captions
                    .iter()
                    .any(|entry| view.lookup(entry).0.is_none())
            })
            .collect()
    }

    /// Keep only captions containing `term` (case-insensitive); drop emptied groups.
    ///
    /// A blank term keeps everything.
    #[must_use]
    pub fn search(groups: Vec<ImageGroup>, term: &str) -> Vec<ImageGroup> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return groups;
        }

        groups
            .into_iter()
            .filter_map(|mut group| {
                group
                    .captions
                    .retain(|entry| entry.caption.content.to_lowercase().contains(&needle));
                (!group.captions.is_empty()).then_some(group)
            })
            .collect()
    }

    /// Apply a feed query: search, then the unvoted filter, then sort.
    pub fn feed<V: VoteView + ?Sized>(
        groups: Vec<ImageGroup>,
        query: &FeedQuery,
        view: &V,
    ) -> Vec<ImageGroup> {
        let mut groups = match query.search.as_deref() {
            Some(term) => Self::search(groups, term),
            None => groups,
        };

        if query.unvoted_only {
            groups = Self::filter_unvoted(groups, view);
        }

        match query.sort {
            FeedSort::Newest => groups,
            FeedSort::Top => Self::sort_top(groups, view),
        }
    }
}
