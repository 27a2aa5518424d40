//! Image repository.

use std::sync::Arc;

use crate::entities::{Image, image};
use captionbattle_common::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Which images a listing may include.
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    /// Only curated images flagged for common use.
    pub common_use_only: bool,
    /// Only images flagged public.
    pub public_only: bool,
    /// Only images created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Maximum number of images.
    pub limit: Option<u64>,
}

/// Image repository for database operations.
#[derive(Clone)]
pub struct ImageRepository {
    db: Arc<DatabaseConnection>,
}

impl ImageRepository {
    /// Create a new image repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// List images matching the filter, newest first.
    pub async fn find_listed(&self, filter: &ImageFilter) -> AppResult<Vec<image::Model>> {
        let mut query = Image::find().order_by_desc(image::Column::CreatedAt);

        if filter.common_use_only {
            query = query.filter(image::Column::IsCommonUse.eq(true));
        }
        if filter.public_only {
            query = query.filter(image::Column::IsPublic.eq(true));
        }
        if let Some(since) = filter.since {
            query = query.filter(image::Column::CreatedAt.gte(since));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }

    /// Create a new image.
    pub async fn create(&self, model: image::ActiveModel) -> AppResult<image::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }
}
