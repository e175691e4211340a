//! Database entities.

#![allow(missing_docs)]

pub mod album;
pub mod album_photo;
pub mod comment;
pub mod photo;
pub mod share;
pub mod user;

pub use album::Entity as Album;
pub use album_photo::Entity as AlbumPhoto;
pub use comment::Entity as Comment;
pub use photo::{Entity as Photo, Visibility};
pub use share::{Entity as Share, PermissionLevel};
pub use user::{Entity as User, UserRole};
