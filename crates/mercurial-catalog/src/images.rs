//! Image materialization: raw uploads in, stable references out.

use std::collections::HashSet;
use std::io::ErrorKind;

use mercurial_core::{ImageRef, ImageUpload, StorageMode};

use crate::error::{CatalogError, SaveWarning, SkipReason};
use crate::store::CatalogConfig;

pub(crate) struct MaterializedBatch {
    pub refs: Vec<ImageRef>,
    pub warnings: Vec<SaveWarning>,
}

/// Materialize a submission batch in order.
///
/// Entries that are not images or exceed the byte limit are skipped with a
/// warning; their sequence index is not reused by later entries. In
/// persisted mode a failed write degrades that entry to an inline reference
/// (warning) unless strict image failures are configured, which makes it
/// fatal. The batch-size cap is the caller's job — it must reject the whole
/// submission before any entry is materialized.
pub(crate) async fn materialize_batch(
    config: &CatalogConfig,
    product_id: &str,
    uploads: &[ImageUpload],
) -> Result<MaterializedBatch, CatalogError> {
    let mut refs = Vec::with_capacity(uploads.len());
    let mut warnings = Vec::new();

    for (index, upload) in uploads.iter().enumerate() {
        if let Some(reason) = skip_reason(config, upload) {
            tracing::warn!(index, reason = %reason, "skipping batch entry");
            warnings.push(SaveWarning::SkippedImage { index, reason });
            continue;
        }

        match config.storage_mode {
            StorageMode::Inline => refs.push(ImageRef::inline(upload)),
            StorageMode::Persisted => match write_image(config, product_id, index, upload).await {
                Ok(reference) => refs.push(reference),
                Err((path, source)) if config.strict_image_failures => {
                    return Err(CatalogError::ImageWrite { path, source });
                }
                Err((path, source)) => {
                    tracing::warn!(
                        index,
                        path = %path,
                        error = %source,
                        "image write failed; keeping the upload inline"
                    );
                    warnings.push(SaveWarning::DegradedToInline {
                        index,
                        detail: source.to_string(),
                    });
                    refs.push(ImageRef::inline(upload));
                }
            },
        }
    }

    Ok(MaterializedBatch { refs, warnings })
}

fn skip_reason(config: &CatalogConfig, upload: &ImageUpload) -> Option<SkipReason> {
    if !upload.is_image() {
        return Some(SkipReason::NotAnImage {
            media_type: upload.media_type.clone(),
        });
    }
    let size = upload.bytes.len() as u64;
    if size > config.max_image_bytes {
        return Some(SkipReason::TooLarge {
            size,
            max: config.max_image_bytes,
        });
    }
    None
}

async fn write_image(
    config: &CatalogConfig,
    product_id: &str,
    index: usize,
    upload: &ImageUpload,
) -> Result<ImageRef, (String, std::io::Error)> {
    let file_name = format!("{product_id}_{index}.{}", upload.extension());
    let path = config.images_dir.join(&file_name);
    let fail = |source| (path.display().to_string(), source);

    tokio::fs::create_dir_all(&config.images_dir)
        .await
        .map_err(fail)?;
    tokio::fs::write(&path, &upload.bytes).await.map_err(fail)?;

    Ok(ImageRef::stored(product_id, index, upload.extension()))
}

/// Delete files of previously stored references that the replacement set no
/// longer carries. Inline references have no file; references that reuse a
/// name just written by the replacement batch are kept.
///
/// Deletion failures are logged and swallowed: the catalog update is the
/// authoritative change, a leftover file is not.
pub(crate) async fn retire_replaced(
    config: &CatalogConfig,
    previous: &[ImageRef],
    replacement: &[ImageRef],
) {
    let kept: HashSet<&str> = replacement.iter().map(ImageRef::as_str).collect();

    for image in previous {
        if image.is_inline() || kept.contains(image.as_str()) {
            continue;
        }
        let Some(file_name) = image.file_name() else {
            continue;
        };
        let path = config.images_dir.join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "retired replaced image file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to retire replaced image file"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercurial_core::StorageMode;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> CatalogConfig {
        CatalogConfig {
            catalog_path: dir.path().join("data").join("products.json"),
            images_dir: dir.path().join("images"),
            ..CatalogConfig::default()
        }
    }

    fn png(bytes: &[u8]) -> ImageUpload {
        ImageUpload::new(bytes.to_vec(), "image/png")
    }

    #[tokio::test]
    async fn persisted_batch_writes_files_in_order() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config(&dir);
        let batch = materialize_batch(&config, "42", &[png(b"a"), png(b"b")])
            .await
            .expect("materialize");

        assert_eq!(
            batch.refs,
            vec![ImageRef::stored("42", 0, "png"), ImageRef::stored("42", 1, "png")]
        );
        assert!(batch.warnings.is_empty());
        assert_eq!(
            std::fs::read(config.images_dir.join("42_0.png")).expect("read"),
            b"a"
        );
        assert_eq!(
            std::fs::read(config.images_dir.join("42_1.png")).expect("read"),
            b"b"
        );
    }

    #[tokio::test]
    async fn inline_mode_writes_no_files() {
        let dir = TempDir::new().expect("tempdir");
        let config = CatalogConfig {
            storage_mode: StorageMode::Inline,
            ..test_config(&dir)
        };
        let batch = materialize_batch(&config, "42", &[png(b"a")])
            .await
            .expect("materialize");

        assert_eq!(batch.refs.len(), 1);
        assert!(batch.refs[0].is_inline());
        assert!(!config.images_dir.exists());
    }

    #[tokio::test]
    async fn skipped_entries_keep_their_index() {
        let dir = TempDir::new().expect("tempdir");
        let config = CatalogConfig {
            max_image_bytes: 4,
            ..test_config(&dir)
        };
        let uploads = [
            png(b"ok"),
            png(b"way too big"),
            ImageUpload::new(b"pdf".to_vec(), "application/pdf"),
            png(b"ok2"),
        ];
        let batch = materialize_batch(&config, "7", &uploads)
            .await
            .expect("materialize");

        assert_eq!(
            batch.refs,
            vec![ImageRef::stored("7", 0, "png"), ImageRef::stored("7", 3, "png")]
        );
        assert_eq!(batch.warnings.len(), 2);
        assert!(matches!(
            batch.warnings[0],
            SaveWarning::SkippedImage {
                index: 1,
                reason: SkipReason::TooLarge { size: 11, max: 4 },
            }
        ));
        assert!(matches!(
            &batch.warnings[1],
            SaveWarning::SkippedImage {
                index: 2,
                reason: SkipReason::NotAnImage { media_type },
            } if media_type == "application/pdf"
        ));
    }

    #[tokio::test]
    async fn write_failure_degrades_to_inline() {
        let dir = TempDir::new().expect("tempdir");
        // A file where the images directory should be makes every write fail.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").expect("write blocker");
        let config = CatalogConfig {
            images_dir: blocker.join("images"),
            ..test_config(&dir)
        };

        let batch = materialize_batch(&config, "9", &[png(b"a")])
            .await
            .expect("non-strict mode must not fail");
        assert_eq!(batch.refs.len(), 1);
        assert!(batch.refs[0].is_inline());
        assert!(matches!(
            batch.warnings[0],
            SaveWarning::DegradedToInline { index: 0, .. }
        ));
    }

    #[tokio::test]
    async fn strict_mode_escalates_write_failure() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").expect("write blocker");
        let config = CatalogConfig {
            images_dir: blocker.join("images"),
            strict_image_failures: true,
            ..test_config(&dir)
        };

        let result = materialize_batch(&config, "9", &[png(b"a")]).await;
        assert!(matches!(result, Err(CatalogError::ImageWrite { .. })));
    }

    #[tokio::test]
    async fn retire_removes_only_dropped_references() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config(&dir);
        std::fs::create_dir_all(&config.images_dir).expect("mkdir");
        for name in ["5_0.jpg", "5_1.jpg", "5_2.jpg"] {
            std::fs::write(config.images_dir.join(name), b"old").expect("write");
        }

        let previous = vec![
            ImageRef::stored("5", 0, "jpg"),
            ImageRef::stored("5", 1, "jpg"),
            ImageRef::stored("5", 2, "jpg"),
        ];
        // Replacement reuses index 0 and drops 1 and 2.
        let replacement = vec![ImageRef::stored("5", 0, "jpg")];
        retire_replaced(&config, &previous, &replacement).await;

        assert!(config.images_dir.join("5_0.jpg").exists());
        assert!(!config.images_dir.join("5_1.jpg").exists());
        assert!(!config.images_dir.join("5_2.jpg").exists());
    }

    #[tokio::test]
    async fn retire_ignores_inline_and_foreign_references() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config(&dir);
        let previous = vec![
            ImageRef::inline(&png(b"a")),
            ImageRef::new("https://cdn.example.com/tee.jpg"),
        ];
        // Nothing to delete and nothing to panic over.
        retire_replaced(&config, &previous, &[]).await;
    }
}
