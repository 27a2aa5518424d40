//! Create caption table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Caption::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Caption::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Caption::ImageId).string_len(64).not_null())
                    .col(ColumnDef::new(Caption::Content).text())
                    .col(
                        ColumnDef::new(Caption::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Caption::ProfileId).string_len(64))
                    .col(
                        ColumnDef::new(Caption::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_caption_image")
                            .from(Caption::Table, Caption::ImageId)
                            .to(Image::Table, Image::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: image_id (for grouping captions by image)
        manager
            .create_index(
                Index::create()
                    .name("idx_caption_image_id")
                    .table(Caption::Table)
                    .col(Caption::ImageId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Caption::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Caption {
    Table,
    Id,
    ImageId,
    Content,
    IsPublic,
    ProfileId,
    CreatedAt,
}

#[derive(Iden)]
enum Image {
    Table,
    Id,
}
