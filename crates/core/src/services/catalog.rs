//! Loads images and captions from the store and normalizes them into groups.

use std::collections::HashMap;

use captionbattle_common::AppResult;
use captionbattle_db::{
    entities::{caption, caption_vote, image},
    repositories::{CaptionRepository, CaptionVoteRepository, ImageFilter, ImageRepository},
};
use tracing::debug;

use crate::model::{Caption, CaptionEntry, Image, ImageGroup};
use crate::services::identity::Voter;
use crate::services::tally_cache::TallyCache;
use crate::vote::{AggregateCount, VoteState, VoteValue};

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    image_repo: ImageRepository,
    caption_repo: CaptionRepository,
    vote_repo: CaptionVoteRepository,
    tallies: TallyCache,
}

impl CatalogService {
    #[must_use]
    pub const fn new(
        image_repo: ImageRepository,
        caption_repo: CaptionRepository,
        vote_repo: CaptionVoteRepository,
        tallies: TallyCache,
    ) -> Self {
        Self {
            image_repo,
            caption_repo,
            vote_repo,
            tallies,
        }
    }

    /// Load every listed image with its captions, counts and the viewer's votes.
    ///
    /// Images come newest first; captions keep store order within an image.
    pub async fn load_groups(
        &self,
        filter: &ImageFilter,
        viewer: Option<&Voter>,
    ) -> AppResult<Vec<ImageGroup>> {
        let images: Vec<_> = self
            .image_repo
            .find_listed(filter)
            .await?
            .into_iter()
            .filter(|image| usable_url(image).is_some())
            .collect();
        let image_ids: Vec<String> = images.iter().map(|image| image.id.clone()).collect();
        let captions = self.caption_repo.find_by_images(&image_ids).await?;

        let mut groups = normalize(images, captions);
        let caption_ids: Vec<String> = groups
            .iter()
            .flat_map(|group| group.captions.iter().map(|entry| entry.caption.id.clone()))
            .collect();

        let counts = self.counts_for(&caption_ids).await?;
        let own_votes = match viewer {
            Some(voter) => own_votes(&self.vote_repo.find_by_profile(&voter.id).await?),
            None => HashMap::new(),
        };

        for entry in groups.iter_mut().flat_map(|group| group.captions.iter_mut()) {
            entry.counts = counts.get(&entry.caption.id).copied().unwrap_or_default();
            entry.my_vote = own_votes
                .get(&entry.caption.id)
                .copied()
                .unwrap_or_default();
        }

        debug!(
            groups = groups.len(),
            captions = caption_ids.len(),
            "Loaded catalog"
        );
        Ok(groups)
    }

    async fn counts_for(
        &self,
        caption_ids: &[String],
    ) -> AppResult<HashMap<String, AggregateCount>> {
        let (mut counts, misses) = self.tallies.get_many(caption_ids).await;
        if misses.is_empty() {
            return Ok(counts);
        }

        let missed: Vec<String> = misses
            .iter()
            .map(|miss| miss.caption_id().to_string())
            .collect();
        let rows = self.vote_repo.find_by_captions(&missed).await?;
        let mut fresh = tally_rows(&rows);
        for id in missed {
            fresh.entry(id).or_default();
        }

        self.tallies.fill(&misses, &fresh).await;
        counts.extend(fresh);
        Ok(counts)
    }
}

fn usable_url(image: &image::Model) -> Option<&str> {
    image
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

/// Turn raw store rows into strict groups.
///
/// Images without a URL, captions without text or without a listed image, and
/// images left with no captions are dropped.
#[must_use]
pub fn normalize(images: Vec<image::Model>, captions: Vec<caption::Model>) -> Vec<ImageGroup> {
    let mut groups: Vec<ImageGroup> = Vec::with_capacity(images.len());
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(images.len());

    for model in &images {
        let Some(url) = usable_url(model) else {
            continue;
        };
        if slots.contains_key(&model.id) {
            continue;
        }
        slots.insert(model.id.clone(), groups.len());
        groups.push(ImageGroup {
            image: Image {
                id: model.id.clone(),
                url: url.to_string(),
            },
            captions: Vec::new(),
        });
    }

    for model in captions {
        let Some(&slot) = slots.get(&model.image_id) else {
            continue;
        };
        let Some(content) = model.content.filter(|text| !text.trim().is_empty()) else {
            continue;
        };
        groups[slot].captions.push(CaptionEntry::unvoted(Caption {
            id: model.id,
            image_id: model.image_id,
            content,
        }));
    }

    groups.retain(|group| !group.captions.is_empty());
    groups
}

fn tally_rows(rows: &[caption_vote::Model]) -> HashMap<String, AggregateCount> {
    let mut counts: HashMap<String, AggregateCount> = HashMap::new();
    for row in rows {
        if let Ok(value) = VoteValue::try_from(row.vote_value) {
            let count = counts.entry(row.caption_id.clone()).or_default();
            *count = count.transition(VoteState::None, value.into());
        }
    }
    counts
}

fn own_votes(rows: &[caption_vote::Model]) -> HashMap<String, VoteState> {
    rows.iter()
        .filter_map(|row| {
            VoteValue::try_from(row.vote_value)
                .ok()
                .map(|value| (row.caption_id.clone(), VoteState::from(value)))
        })
        .collect()
}
