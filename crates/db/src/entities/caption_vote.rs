//! Caption vote entity. One row per (profile, caption); absence means "no vote".

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "caption_vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub caption_id: String,

    /// Voter
    #[sea_orm(indexed)]
    pub profile_id: String,

    /// +1 or -1, never 0
    pub vote_value: i16,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub modified_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::caption::Entity",
        from = "Column::CaptionId",
        to = "super::caption::Column::Id",
        on_delete = "Cascade"
    )]
    Caption,

    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::ProfileId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Profile,
}

impl Related<super::caption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Caption.def()
    }
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
