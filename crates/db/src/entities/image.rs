//! Image entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// CDN URL of the uploaded image. Rows without one are never served.
    #[sea_orm(nullable)]
    pub url: Option<String>,

    /// Curated images shown to every visitor
    #[sea_orm(default_value = false)]
    pub is_common_use: bool,

    #[sea_orm(default_value = false)]
    pub is_public: bool,

    /// Uploader, if any
    #[sea_orm(nullable)]
    pub profile_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::caption::Entity")]
    Captions,
}

impl Related<super::caption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Captions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
