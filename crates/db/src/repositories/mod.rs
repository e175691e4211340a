//! Repositories wrapping sea-orm queries for each entity.

pub mod album;
pub mod comment;
pub mod photo;
pub mod share;
pub mod user;

pub use album::AlbumRepository;
pub use comment::CommentRepository;
pub use photo::PhotoRepository;
pub use share::ShareRepository;
pub use user::UserRepository;
