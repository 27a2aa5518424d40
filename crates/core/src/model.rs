//! Strict domain entities handed to the core after normalization.

use serde::Serialize;

use crate::vote::{AggregateCount, VoteState};

/// An image with a servable URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub url: String,
}

/// A caption with non-empty text, attached to exactly one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    pub id: String,
    pub image_id: String,
    pub content: String,
}

/// A caption together with its baseline counts and the viewer's own vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionEntry {
    pub caption: Caption,
    pub counts: AggregateCount,
    pub my_vote: VoteState,
}

impl CaptionEntry {
    /// Entry with no votes at all.
    #[must_use]
    pub fn unvoted(caption: Caption) -> Self {
        Self {
            caption,
            counts: AggregateCount::default(),
            my_vote: VoteState::None,
        }
    }
}

/// An image and the captions attached to it, in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGroup {
    pub image: Image,
    pub captions: Vec<CaptionEntry>,
}
