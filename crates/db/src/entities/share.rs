//! Share entity - a per-(photo, user) permission grant.

use std::str::FromStr;

use photoshare_common::AppError;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Capability carried by a share.
///
/// Any grant allows viewing. `Comment` adds commenting; only `Admin` allows
/// editing. The levels are ordered by capability but `Comment` does not imply edit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionLevel {
    #[sea_orm(string_value = "read")]
    Read,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl PermissionLevel {
    /// Whether this level allows commenting.
    #[must_use]
    pub const fn allows_comment(&self) -> bool {
        matches!(self, Self::Comment | Self::Admin)
    }

    /// Whether this level allows editing photo metadata.
    #[must_use]
    pub const fn allows_edit(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl FromStr for PermissionLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "comment" => Ok(Self::Comment),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown permission level: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "share")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Shared photo
    #[sea_orm(indexed)]
    pub photo_id: String,

    /// Grantee
    #[sea_orm(indexed)]
    pub user_id: String,

    pub permission_level: PermissionLevel,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::photo::Entity",
        from = "Column::PhotoId",
        to = "super::photo::Column::Id",
        on_delete = "Cascade"
    )]
    Photo,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photo.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_capabilities() {
        assert!(!PermissionLevel::Read.allows_comment());
        assert!(PermissionLevel::Comment.allows_comment());
        assert!(PermissionLevel::Admin.allows_comment());

        assert!(!PermissionLevel::Read.allows_edit());
        assert!(!PermissionLevel::Comment.allows_edit());
        assert!(PermissionLevel::Admin.allows_edit());
    }

    #[test]
    fn test_level_ordering() {
        assert!(PermissionLevel::Read < PermissionLevel::Comment);
        assert!(PermissionLevel::Comment < PermissionLevel::Admin);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("COMMENT".parse::<PermissionLevel>().ok(), Some(PermissionLevel::Comment));
        assert!(matches!(
            "owner".parse::<PermissionLevel>(),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
