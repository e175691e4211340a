//! Photo entity (an uploaded image and its derived thumbnail).

use std::str::FromStr;

use photoshare_common::AppError;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Photo-level visibility, independent of sharing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    /// Visible to the owner, admins and grantees.
    #[default]
    #[sea_orm(string_value = "private")]
    Private,
    /// Visible to everyone, including anonymous callers.
    #[sea_orm(string_value = "public")]
    Public,
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "public" => Ok(Self::Public),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown visibility: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photo")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner user ID, fixed at creation
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// File name as supplied by the uploader (display only)
    pub original_filename: String,

    /// Generated name of the original bytes in the upload root
    #[sea_orm(unique)]
    pub storage_filename: String,

    /// Generated thumbnail name; may equal `storage_filename` after a failed resize
    #[sea_orm(nullable)]
    pub thumbnail_filename: Option<String>,

    /// Content type declared at upload
    pub content_type: String,

    /// File size in bytes
    pub size: i64,

    pub visibility: Visibility,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether anyone may view this photo.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Whether a separate thumbnail file was produced for this photo.
    #[must_use]
    pub fn has_distinct_thumbnail(&self) -> bool {
        self.thumbnail_filename
            .as_deref()
            .is_some_and(|thumb| thumb != self.storage_filename)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::share::Entity")]
    Shares,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_many = "super::album_photo::Entity")]
    AlbumPhotos,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::share::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::album_photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlbumPhotos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
