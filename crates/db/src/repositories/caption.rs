//! Caption repository.

use std::sync::Arc;

use crate::entities::{Caption, caption};
use captionbattle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Caption repository for database operations.
#[derive(Clone)]
pub struct CaptionRepository {
    db: Arc<DatabaseConnection>,
}

impl CaptionRepository {
    /// Create a new caption repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Captions attached to any of the given images, oldest first so that
    /// encounter order within an image is stable across loads.
    pub async fn find_by_images(&self, image_ids: &[String]) -> AppResult<Vec<caption::Model>> {
        if image_ids.is_empty() {
            return Ok(vec![]);
        }

        Caption::find()
            .filter(caption::Column::ImageId.is_in(image_ids.iter().cloned()))
            .order_by_asc(caption::Column::CreatedAt)
            .order_by_asc(caption::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }

    /// Create a new caption.
    pub async fn create(&self, model: caption::ActiveModel) -> AppResult<caption::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_caption(id: &str, image_id: &str) -> caption::Model {
        caption::Model {
            id: id.to_string(),
            image_id: image_id.to_string(),
            content: Some("when the coffee kicks in".to_string()),
            is_public: true,
            profile_id: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_images() {
        let c1 = create_test_caption("c1", "img1");
        let c2 = create_test_caption("c2", "img1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = CaptionRepository::new(db);
        let result = repo.find_by_images(&["img1".to_string()]).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "c1");
    }
}
