//! Caption vote repository.

use std::sync::Arc;

use crate::entities::{CaptionVote, caption_vote};
use captionbattle_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Caption vote repository for database operations.
///
/// Every mutation here touches exactly one row, so each one is atomic on its own.
#[derive(Clone)]
pub struct CaptionVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl CaptionVoteRepository {
    /// Create a new caption vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the vote a profile cast on a caption.
    pub async fn find_by_profile_and_caption(
        &self,
        profile_id: &str,
        caption_id: &str,
    ) -> AppResult<Option<caption_vote::Model>> {
        CaptionVote::find()
            .filter(caption_vote::Column::ProfileId.eq(profile_id))
            .filter(caption_vote::Column::CaptionId.eq(caption_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }

    /// Insert a new vote row.
    pub async fn create(
        &self,
        model: caption_vote::ActiveModel,
    ) -> AppResult<caption_vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }

    /// Change the polarity of an existing vote in place.
    pub async fn update_value(
        &self,
        existing: caption_vote::Model,
        vote_value: i16,
    ) -> AppResult<caption_vote::Model> {
        let mut active: caption_vote::ActiveModel = existing.into();
        active.vote_value = Set(vote_value);
        active.modified_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }

    /// Delete a vote row by ID.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        CaptionVote::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;
        Ok(())
    }

    /// All votes cast by a profile.
    pub async fn find_by_profile(&self, profile_id: &str) -> AppResult<Vec<caption_vote::Model>> {
        CaptionVote::find()
            .filter(caption_vote::Column::ProfileId.eq(profile_id))
            .order_by_desc(caption_vote::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }

    /// All live votes on a caption.
    pub async fn find_by_caption(&self, caption_id: &str) -> AppResult<Vec<caption_vote::Model>> {
        CaptionVote::find()
            .filter(caption_vote::Column::CaptionId.eq(caption_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }

    /// All live votes on any of the given captions.
    pub async fn find_by_captions(
        &self,
        caption_ids: &[String],
    ) -> AppResult<Vec<caption_vote::Model>> {
        if caption_ids.is_empty() {
            return Ok(vec![]);
        }

        CaptionVote::find()
            .filter(caption_vote::Column::CaptionId.is_in(caption_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }
}
