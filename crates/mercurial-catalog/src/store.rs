use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::sync::Mutex;

use mercurial_core::{AppConfig, ProductRecord, StorageMode};

use crate::error::CatalogError;

const DEFAULT_MAX_IMAGES: usize = 5;
const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Settings of one catalog store instance.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// The catalog document, a single pretty-printed JSON array.
    pub catalog_path: PathBuf,
    /// Directory that receives materialized image files.
    pub images_dir: PathBuf,
    pub max_images: usize,
    pub max_image_bytes: u64,
    pub storage_mode: StorageMode,
    pub strict_image_failures: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("./data/products.json"),
            images_dir: PathBuf::from("./images"),
            max_images: DEFAULT_MAX_IMAGES,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            storage_mode: StorageMode::Persisted,
            strict_image_failures: false,
        }
    }
}

impl CatalogConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            catalog_path: config.catalog_path(),
            images_dir: config.images_dir.clone(),
            max_images: config.max_images,
            max_image_bytes: config.max_image_bytes,
            storage_mode: config.storage_mode,
            strict_image_failures: config.strict_image_failures,
        }
    }
}

/// The durable product catalog: one JSON document, replaced wholesale on
/// every save.
///
/// The store owns the read-modify-write cycle. Writers serialize on
/// `write_lock`; readers go straight to the document, which is safe because
/// the document is only ever replaced via rename.
pub struct CatalogStore {
    pub(crate) config: CatalogConfig,
    pub(crate) write_lock: Mutex<()>,
}

impl CatalogStore {
    #[must_use]
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Load the full catalog.
    ///
    /// A missing document is an empty catalog. An unreadable or unparsable
    /// document is also treated as empty — the storefront renders nothing
    /// rather than erroring — but is logged, since for a document that
    /// exists this means data is being ignored.
    pub async fn load(&self) -> Vec<ProductRecord> {
        let path = &self.config.catalog_path;
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "catalog document unreadable; treating catalog as empty"
                );
                return Vec::new();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "catalog document failed to parse; treating catalog as empty"
                );
                Vec::new()
            }
        }
    }

    /// Whether the catalog document currently exists on disk.
    pub async fn document_exists(&self) -> bool {
        tokio::fs::try_exists(&self.config.catalog_path)
            .await
            .unwrap_or(false)
    }

    /// Replace the catalog document with `records`, atomically: the new
    /// content lands in a sibling temp file first and is renamed over the
    /// document, so readers never observe a torn write.
    pub(crate) async fn persist(&self, records: &[ProductRecord]) -> Result<(), CatalogError> {
        let path = &self.config.catalog_path;
        let store_write = |source| CatalogError::StoreWrite {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(store_write)?;
        }

        let body = serde_json::to_vec_pretty(records).map_err(CatalogError::Encode)?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &body).await.map_err(store_write)?;
        tokio::fs::rename(&tmp, path).await.map_err(store_write)?;

        tracing::debug!(
            path = %path.display(),
            products = records.len(),
            "catalog document replaced"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mercurial_core::ImageRef;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> CatalogConfig {
        CatalogConfig {
            catalog_path: dir.path().join("data").join("products.json"),
            images_dir: dir.path().join("images"),
            ..CatalogConfig::default()
        }
    }

    fn make_record(id: &str) -> ProductRecord {
        let now = Utc::now();
        ProductRecord {
            id: id.to_string(),
            name: "Tee".to_string(),
            description: "cotton".to_string(),
            category: "shirts".to_string(),
            price: Decimal::new(1999, 2),
            stock: 3,
            sku: format!("ST-{id}"),
            images: vec![ImageRef::stored(id, 0, "jpg")],
            created_at: now,
            saved_at: now,
        }
    }

    #[tokio::test]
    async fn load_missing_document_returns_empty() {
        let dir = TempDir::new().expect("tempdir");
        let store = CatalogStore::new(test_config(&dir));
        assert!(store.load().await.is_empty());
        assert!(!store.document_exists().await);
    }

    #[tokio::test]
    async fn load_corrupt_document_returns_empty() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config(&dir);
        std::fs::create_dir_all(config.catalog_path.parent().unwrap()).expect("mkdir");
        std::fs::write(&config.catalog_path, b"{not json").expect("write");
        let store = CatalogStore::new(config);
        assert!(store.load().await.is_empty());
        assert!(store.document_exists().await);
    }

    #[tokio::test]
    async fn persist_then_load_roundtrips() {
        let dir = TempDir::new().expect("tempdir");
        let store = CatalogStore::new(test_config(&dir));
        let records = vec![make_record("1"), make_record("2")];
        store.persist(&records).await.expect("persist");

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "1");
        assert_eq!(loaded[1].id, "2");
    }

    #[tokio::test]
    async fn persist_writes_pretty_json_with_wire_names() {
        let dir = TempDir::new().expect("tempdir");
        let store = CatalogStore::new(test_config(&dir));
        store.persist(&[make_record("1")]).await.expect("persist");

        let raw = std::fs::read_to_string(&store.config().catalog_path).expect("read");
        assert!(raw.starts_with("[\n"), "document should be pretty-printed");
        assert!(raw.contains("\"createdAt\""));
        assert!(raw.contains("\"savedAt\""));
        assert!(raw.contains("\"price\": 19.99"));
    }

    #[tokio::test]
    async fn persist_leaves_no_temp_file_behind() {
        let dir = TempDir::new().expect("tempdir");
        let store = CatalogStore::new(test_config(&dir));
        store.persist(&[make_record("1")]).await.expect("persist");

        let data_dir = store.config().catalog_path.parent().unwrap();
        let names: Vec<String> = std::fs::read_dir(data_dir)
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["products.json".to_string()]);
    }
}
