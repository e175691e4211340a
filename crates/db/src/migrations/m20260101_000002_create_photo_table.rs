//! Create photo table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Photo::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Photo::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Photo::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Photo::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Photo::Description).text())
                    .col(ColumnDef::new(Photo::OriginalFilename).string_len(512).not_null())
                    .col(ColumnDef::new(Photo::StorageFilename).string_len(128).not_null())
                    .col(ColumnDef::new(Photo::ThumbnailFilename).string_len(160))
                    .col(ColumnDef::new(Photo::ContentType).string_len(128).not_null())
                    .col(ColumnDef::new(Photo::Size).big_integer().not_null())
                    .col(
                        ColumnDef::new(Photo::Visibility)
                            .string_len(16)
                            .not_null()
                            .default("private"),
                    )
                    .col(
                        ColumnDef::new(Photo::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_photo_user")
                            .from(Photo::Table, Photo::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: storage_filename (names never repeat)
        manager
            .create_index(
                Index::create()
                    .name("idx_photo_storage_filename")
                    .table(Photo::Table)
                    .col(Photo::StorageFilename)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (owner listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_photo_user_id")
                    .table(Photo::Table)
                    .col(Photo::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: visibility (public listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_photo_visibility")
                    .table(Photo::Table)
                    .col(Photo::Visibility)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Photo::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Photo {
    Table,
    Id,
    UserId,
    Title,
    Description,
    OriginalFilename,
    StorageFilename,
    ThumbnailFilename,
    ContentType,
    Size,
    Visibility,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
