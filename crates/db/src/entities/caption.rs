//! Caption entity (generated text attached to an image).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "caption")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub image_id: String,

    /// Caption text. Older pipeline runs left this empty.
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_public: bool,

    #[sea_orm(nullable)]
    pub profile_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::image::Entity",
        from = "Column::ImageId",
        to = "super::image::Column::Id",
        on_delete = "Cascade"
    )]
    Image,

    #[sea_orm(has_many = "super::caption_vote::Entity")]
    CaptionVotes,
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Image.def()
    }
}

impl Related<super::caption_vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CaptionVotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
