//! Create caption vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CaptionVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CaptionVote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CaptionVote::CaptionId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CaptionVote::ProfileId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CaptionVote::VoteValue)
                            .small_integer()
                            .not_null()
                            .check(Expr::col(CaptionVote::VoteValue).is_in([1, -1])),
                    )
                    .col(
                        ColumnDef::new(CaptionVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(CaptionVote::ModifiedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_caption_vote_caption")
                            .from(CaptionVote::Table, CaptionVote::CaptionId)
                            .to(Caption::Table, Caption::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_caption_vote_profile")
                            .from(CaptionVote::Table, CaptionVote::ProfileId)
                            .to(Profile::Table, Profile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (profile_id, caption_id) - one vote per voter per caption
        manager
            .create_index(
                Index::create()
                    .name("idx_caption_vote_profile_caption")
                    .table(CaptionVote::Table)
                    .col(CaptionVote::ProfileId)
                    .col(CaptionVote::CaptionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: caption_id (for tallying a caption's votes)
        manager
            .create_index(
                Index::create()
                    .name("idx_caption_vote_caption_id")
                    .table(CaptionVote::Table)
                    .col(CaptionVote::CaptionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CaptionVote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CaptionVote {
    Table,
    Id,
    CaptionId,
    ProfileId,
    VoteValue,
    CreatedAt,
    ModifiedAt,
}

#[derive(Iden)]
enum Caption {
    Table,
    Id,
}

#[derive(Iden)]
enum Profile {
    Table,
    Id,
}
