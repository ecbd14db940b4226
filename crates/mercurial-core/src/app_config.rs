use std::net::SocketAddr;
use std::path::PathBuf;

/// Where materialized images live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Image bytes are written under the images directory and referenced by
    /// path.
    Persisted,
    /// Image bytes stay embedded in the catalog document as `data:` URIs;
    /// nothing is written outside the catalog. This is the demo/no-storage
    /// deployment.
    Inline,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::Persisted => write!(f, "persisted"),
            StorageMode::Inline => write!(f, "inline"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Directory holding the catalog document (`products.json`).
    pub data_dir: PathBuf,
    /// Directory holding materialized image files.
    pub images_dir: PathBuf,
    pub max_images: usize,
    pub max_image_bytes: u64,
    pub storage_mode: StorageMode,
    /// When set, a failed image write fails the whole save instead of
    /// degrading that image to an inline reference.
    pub strict_image_failures: bool,
}

impl AppConfig {
    /// Path of the catalog document inside the data directory.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("products.json")
    }
}
