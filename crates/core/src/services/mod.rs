//! Business logic services.

#![allow(missing_docs)]

pub mod album;
pub mod authorization;
pub mod comment;
pub mod ingestion;
pub mod media;
pub mod photo;
pub mod retrieval;
pub mod sharing;
pub mod user;

pub use album::{AlbumService, CreateAlbumInput, UpdateAlbumInput};
pub use authorization::{
    AlbumAction, AuthorizationService, Caller, Owned, PhotoAction, PhotoPermissions, is_owner,
};
pub use comment::{AddCommentInput, CommentService};
pub use ingestion::{
    IngestionService, ThumbnailStatus, UploadOutcome, UploadRequest, storage_filename,
};
pub use media::{
    ImageDimensions, ImageFormat, MediaConfig, MediaService, ProcessedImage, ThumbnailError,
    thumbnail_dimensions,
};
pub use photo::{PhotoService, UpdatePhotoInput};
pub use retrieval::{MediaBytes, MediaRetrievalService};
pub use sharing::SharingService;
pub use user::{RegisterUserInput, UserAdminService};
