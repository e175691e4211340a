//! Media processing: content sniffing and thumbnail rendering.
//!
//! Everything here is blocking and CPU-bound; async callers run it on
//! `tokio::task::spawn_blocking`.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use photoshare_common::{AppError, AppResult, IngestionConfig};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG format
    Jpeg,
    /// PNG format
    Png,
    /// GIF format
    Gif,
    /// WebP format
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    /// Get file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }

    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Map a format detected by the `image` crate.
    #[must_use]
    pub const fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Scale `(width, height)` so the longer edge equals `max_edge`.
///
/// The shorter edge is rounded to the nearest pixel and never drops below 1.
#[must_use]
pub fn thumbnail_dimensions(width: u32, height: u32, max_edge: u32) -> ImageDimensions {
    let max_edge = max_edge.max(1);
    let scale = |short: u32, long: u32| -> u32 {
        let long = u64::from(long.max(1));
        let scaled = (u64::from(short) * u64::from(max_edge) + long / 2) / long;
        u32::try_from(scaled).unwrap_or(max_edge).clamp(1, max_edge)
    };

    if width >= height {
        ImageDimensions {
            width: max_edge,
            height: scale(height, width),
        }
    } else {
        ImageDimensions {
            width: scale(width, height),
            height: max_edge,
        }
    }
}

/// Why a thumbnail could not be produced.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// The source bytes are not a decodable image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Decoding succeeded but resizing or encoding failed.
    #[error("Failed to render thumbnail: {0}")]
    Render(String),
}

/// Processed image result.
#[derive(Debug)]
pub struct ProcessedImage {
    /// Encoded image data
    pub data: Vec<u8>,
    /// Format of `data`
    pub format: ImageFormat,
    /// Dimensions of the encoded image
    pub dimensions: ImageDimensions,
}

/// Media processing configuration.
#[derive(Debug, Clone, Copy)]
pub struct MediaConfig {
    /// Longer edge of generated thumbnails
    pub thumbnail_max_edge: u32,
    /// JPEG quality for thumbnails (1-100)
    pub thumbnail_quality: u8,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            thumbnail_max_edge: 300,
            thumbnail_quality: 85,
        }
    }
}

impl From<&IngestionConfig> for MediaConfig {
    fn from(config: &IngestionConfig) -> Self {
        Self {
            thumbnail_max_edge: config.thumbnail_max_edge,
            thumbnail_quality: config.thumbnail_quality.clamp(1, 100),
        }
    }
}

/// Media processing service.
#[derive(Debug, Clone, Copy)]
pub struct MediaService {
    config: MediaConfig,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub const fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Probe the image format of a file from its leading bytes.
    ///
    /// Returns `None` when the content is not one of the supported formats,
    /// regardless of the file's name.
    pub fn sniff_file(&self, path: &Path) -> AppResult<Option<ImageFormat>> {
        let reader = File::open(path)
            .map(|file| ImageReader::new(BufReader::new(file)))
            .and_then(ImageReader::with_guessed_format)
            .map_err(|e| AppError::StorageFailure(format!("Failed to probe upload: {e}")))?;

        Ok(reader.format().and_then(ImageFormat::from_image_format))
    }

    /// Decode image bytes, detecting the format from content.
    pub fn decode(&self, data: &[u8]) -> Result<DynamicImage, ThumbnailError> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ThumbnailError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| ThumbnailError::Decode(e.to_string()))
    }

    /// Generate a JPEG thumbnail whose longer edge is the configured maximum.
    pub fn generate_thumbnail(&self, data: &[u8]) -> Result<ProcessedImage, ThumbnailError> {
        let source = self.decode(data)?;
        self.render_thumbnail(&source)
    }

    /// Resize an already decoded image and encode it as JPEG.
    pub fn render_thumbnail(&self, source: &DynamicImage) -> Result<ProcessedImage, ThumbnailError> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(ThumbnailError::Render("Image has no pixels".to_string()));
        }

        let target = thumbnail_dimensions(width, height, self.config.thumbnail_max_edge);
        let resized = source
            .resize_exact(target.width, target.height, FilterType::Triangle)
            .to_rgb8();

        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, self.config.thumbnail_quality)
            .encode_image(&resized)
            .map_err(|e| ThumbnailError::Render(e.to_string()))?;

        tracing::debug!(
            source_width = width,
            source_height = height,
            width = target.width,
            height = target.height,
            bytes = data.len(),
            "Rendered thumbnail"
        );

        Ok(ProcessedImage {
            data,
            format: ImageFormat::Jpeg,
            dimensions: target,
        })
    }

    /// Check if a MIME type names a supported image format.
    #[must_use]
    pub fn is_supported_image(&self, mime_type: &str) -> bool {
        ImageFormat::from_mime_type(mime_type).is_some()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MediaConfig {
        &self.config
    }
}
