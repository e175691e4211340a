//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload pipeline configuration.
    #[serde(default)]
    pub ingestion: IngestionConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://...`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Where uploaded bytes live on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding originals and thumbnails. Created if absent.
    #[serde(default = "default_upload_root")]
    pub upload_root: PathBuf,
    /// Directory for per-upload scratch files used while sniffing content.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

/// Upload pipeline limits and thumbnail settings.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Payload ceiling in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Content types accepted both as declared and as sniffed type.
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
    /// Longest edge of generated thumbnails, in pixels.
    #[serde(default = "default_thumbnail_max_edge")]
    pub thumbnail_max_edge: u32,
    /// JPEG quality used for thumbnails (1-100).
    #[serde(default = "default_thumbnail_quality")]
    pub thumbnail_quality: u8,
    /// Prefix prepended to the storage name to form the thumbnail name.
    #[serde(default = "default_thumbnail_prefix")]
    pub thumbnail_prefix: String,
    /// Upper bound on the whole pipeline for one upload.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Uploads processed at the same time; further uploads wait.
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_upload_root() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

const fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_content_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/gif", "image/webp"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

const fn default_thumbnail_max_edge() -> u32 {
    300
}

const fn default_thumbnail_quality() -> u8 {
    85
}

fn default_thumbnail_prefix() -> String {
    "thumb_".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_max_concurrent_uploads() -> usize {
    8
}

fn default_log_filter() -> String {
    "photoshare=info,sea_orm=warn".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_root: default_upload_root(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            allowed_content_types: default_allowed_content_types(),
            thumbnail_max_edge: default_thumbnail_max_edge(),
            thumbnail_quality: default_thumbnail_quality(),
            thumbnail_prefix: default_thumbnail_prefix(),
            timeout_secs: default_timeout_secs(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl IngestionConfig {
    /// Whether `content_type` is on the allow-list (case-insensitive).
    #[must_use]
    pub fn is_allowed(&self, content_type: &str) -> bool {
        let content_type = content_type.trim();
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `PHOTOSHARE_ENV`)
    /// 4. Environment variables with `PHOTOSHARE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let env = std::env::var("PHOTOSHARE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PHOTOSHARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("PHOTOSHARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ingestion_defaults() {
        let config = IngestionConfig::default();
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.thumbnail_max_edge, 300);
        assert_eq!(config.thumbnail_prefix, "thumb_");
        assert!(config.is_allowed("image/jpeg"));
        assert!(config.is_allowed("IMAGE/PNG"));
        assert!(config.is_allowed("image/webp"));
        assert!(!config.is_allowed("image/svg+xml"));
        assert!(!config.is_allowed("application/pdf"));
    }

    #[test]
    fn test_from_file_fills_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[database]\nurl = \"postgres://localhost/photoshare\"\n\n[ingestion]\nthumbnail_max_edge = 128\n"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.database.url, "postgres://localhost/photoshare");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.ingestion.thumbnail_max_edge, 128);
        assert_eq!(config.ingestion.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.storage.upload_root, PathBuf::from("./uploads"));
        assert!(!config.logging.json);
    }
}
