//! Battle sequence generation.
//!
//! Paired mode turns every image with two or more captions into all of its
//! unordered caption pairs, shuffles the lot and caps it. Single mode
//! flattens every caption into a shuffled queue with no cap.

use rand::Rng;
use serde::Serialize;

use crate::model::{Caption, ImageGroup};

/// Default ceiling on pairs per session.
pub const DEFAULT_MAX_PAIRS: usize = 300;

/// Two captions on the same image, presented head to head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattlePair {
    pub image_url: String,
    pub caption_a: Caption,
    pub caption_b: Caption,
}

/// One caption presented alone (feed game).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleBattle {
    pub image_url: String,
    pub caption: Caption,
}

/// Uniform in-place shuffle: walk from the last index down, swapping each
/// slot with a uniformly chosen slot in `[0, i]`.
pub fn fisher_yates<T, R>(items: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Builds battle sequences from grouped captions.
#[derive(Debug, Clone, Copy)]
pub struct PairGenerator {
    max_pairs: usize,
}

impl Default for PairGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAIRS)
    }
}

impl PairGenerator {
    /// Create a generator with a hard ceiling on paired-mode output.
    #[must_use]
    pub const fn new(max_pairs: usize) -> Self {
        Self { max_pairs }
    }

    /// The configured ceiling.
    #[must_use]
    pub const fn max_pairs(&self) -> usize {
        self.max_pairs
    }

    /// Every unordered pair `(c_i, c_j), i < j` within each group, groups in order.
    #[must_use]
    pub fn unordered_pairs(groups: &[ImageGroup]) -> Vec<BattlePair> {
        let total: usize = groups
            .iter()
            .map(|g| {
                let n = g.captions.len();
                n * n.saturating_sub(1) / 2
            })
            .sum();
        let mut pairs = Vec::with_capacity(total);

        for group in groups {
            let captions = &group.captions;
            for i in 0..captions.len() {
                for j in (i + 1)..captions.len() {
                    pairs.push(BattlePair {
                        image_url: group.image.url.clone(),
                        caption_a: captions[i].caption.clone(),
                        caption_b: captions[j].caption.clone(),
                    });
                }
            }
        }

        pairs
    }

    /// Paired mode: all pairs, shuffled, truncated to the ceiling.
    pub fn battle_pairs<R>(&self, groups: &[ImageGroup], rng: &mut R) -> Vec<BattlePair>
    where
        R: Rng + ?Sized,
    {
        let mut pairs = Self::unordered_pairs(groups);
        let generated = pairs.len();

        fisher_yates(&mut pairs, rng);
        pairs.truncate(self.max_pairs);

        tracing::debug!(
            generated,
            kept = pairs.len(),
            max = self.max_pairs,
            "Generated battle pairs"
        );
        pairs
    }

    /// Single-caption mode: every caption once, shuffled, uncapped.
    pub fn single_queue<R>(groups: &[ImageGroup], rng: &mut R) -> Vec<SingleBattle>
    where
        R: Rng + ?Sized,
    {
        let mut queue: Vec<SingleBattle> = groups
            .iter()
            .flat_map(|group| {
                group.captions.iter().map(|entry| SingleBattle {
                    image_url: group.image.url.clone(),
                    caption: entry.caption.clone(),
                })
            })
            .collect();

        fisher_yates(&mut queue, rng);
        queue
    }
}
