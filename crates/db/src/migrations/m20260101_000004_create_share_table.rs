//! Create share table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Share::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Share::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Share::PhotoId).string_len(32).not_null())
                    .col(ColumnDef::new(Share::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Share::PermissionLevel).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Share::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_share_photo")
                            .from(Share::Table, Share::PhotoId)
                            .to(Photo::Table, Photo::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_share_user")
                            .from(Share::Table, Share::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (photo_id, user_id) - at most one grant per pair
        manager
            .create_index(
                Index::create()
                    .name("idx_share_photo_user")
                    .table(Share::Table)
                    .col(Share::PhotoId)
                    .col(Share::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id ("shared with me" listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_share_user_id")
                    .table(Share::Table)
                    .col(Share::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Share::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Share {
    Table,
    Id,
    PhotoId,
    UserId,
    PermissionLevel,
    CreatedAt,
}

#[derive(Iden)]
enum Photo {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
