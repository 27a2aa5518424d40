//! Profile entity (a voter known to the auth provider).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub username: String,

    /// Bearer credential issued by the auth provider
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::caption_vote::Entity")]
    CaptionVotes,
}

impl Related<super::caption_vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CaptionVotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
