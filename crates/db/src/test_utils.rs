//! Test utilities for database-backed code.
//!
//! Fixture builders for every entity plus helpers around `MockDatabase`, so that
//! services in other crates can be tested without a running `PostgreSQL`.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

use crate::entities::{caption, caption_vote, image, profile};

/// Build a profile with a bearer token of `"{id}-token"`.
#[must_use]
pub fn profile_fixture(id: &str) -> profile::Model {
    profile::Model {
        id: id.to_string(),
        username: id.to_string(),
        token: Some(format!("{id}-token")),
        created_at: Utc::now().into(),
    }
}

/// Build a common-use, public image served from a fake CDN.
#[must_use]
pub fn image_fixture(id: &str) -> image::Model {
    image::Model {
        id: id.to_string(),
        url: Some(format!("https://cdn.example.com/{id}.jpg")),
        is_common_use: true,
        is_public: true,
        profile_id: None,
        created_at: Utc::now().into(),
    }
}

/// Build a caption on `image_id` with the given text.
#[must_use]
pub fn caption_fixture(id: &str, image_id: &str, content: &str) -> caption::Model {
    caption::Model {
        id: id.to_string(),
        image_id: image_id.to_string(),
        content: Some(content.to_string()),
        is_public: true,
        profile_id: None,
        created_at: Utc::now().into(),
    }
}

/// Build a vote row.
#[must_use]
pub fn vote_fixture(
    id: &str,
    profile_id: &str,
    caption_id: &str,
    value: i16,
) -> caption_vote::Model {
    caption_vote::Model {
        id: id.to_string(),
        caption_id: caption_id.to_string(),
        profile_id: profile_id.to_string(),
        vote_value: value,
        created_at: Utc::now().into(),
        modified_at: None,
    }
}

/// Exec result for a single-row delete or update.
#[must_use]
pub const fn one_row_affected() -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: 1,
    }
}

/// A fresh Postgres-flavoured mock database.
#[must_use]
pub fn mock_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

/// Wrap a mock into the shared connection type repositories expect.
#[must_use]
pub fn into_shared(mock: MockDatabase) -> Arc<DatabaseConnection> {
    Arc::new(mock.into_connection())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_fixture_token() {
        let profile = profile_fixture("alice");
        assert_eq!(profile.token.as_deref(), Some("alice-token"));
    }

    #[test]
    fn test_image_fixture_is_listed() {
        let image = image_fixture("img1");
        assert!(image.is_common_use);
        assert_eq!(image.url.as_deref(), Some("https://cdn.example.com/img1.jpg"));
    }
}
