//! Create album and album_photo tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Album::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Album::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Album::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Album::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Album::Description).text())
                    .col(
                        ColumnDef::new(Album::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Album::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_album_user")
                            .from(Album::Table, Album::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_album_user_id")
                    .table(Album::Table)
                    .col(Album::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AlbumPhoto::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlbumPhoto::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AlbumPhoto::AlbumId).string_len(32).not_null())
                    .col(ColumnDef::new(AlbumPhoto::PhotoId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(AlbumPhoto::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_album_photo_album")
                            .from(AlbumPhoto::Table, AlbumPhoto::AlbumId)
                            .to(Album::Table, Album::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_album_photo_photo")
                            .from(AlbumPhoto::Table, AlbumPhoto::PhotoId)
                            .to(Photo::Table, Photo::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: a photo appears in an album at most once
        manager
            .create_index(
                Index::create()
                    .name("idx_album_photo_album_photo")
                    .table(AlbumPhoto::Table)
                    .col(AlbumPhoto::AlbumId)
                    .col(AlbumPhoto::PhotoId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AlbumPhoto::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Album::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Album {
    Table,
    Id,
    UserId,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AlbumPhoto {
    Table,
    Id,
    AlbumId,
    PhotoId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Photo {
    Table,
    Id,
}
