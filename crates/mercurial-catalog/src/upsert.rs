//! The save path: one create-or-update operation keyed by product id.

use chrono::Utc;

use mercurial_core::{
    generate_product_id, generate_sku, validate_draft, ImageUpload, ProductDraft, ProductRecord,
    ValidationError,
};

use crate::error::{CatalogError, SaveWarning};
use crate::images::{materialize_batch, retire_replaced};
use crate::store::CatalogStore;

/// Result of a successful save.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// The record as persisted, with finalized image references.
    pub record: ProductRecord,
    /// `false` when an existing record was replaced.
    pub created: bool,
    pub warnings: Vec<SaveWarning>,
}

impl CatalogStore {
    /// Create or update one product.
    ///
    /// Field validation and the batch-size cap run before anything is
    /// touched. The rest — image materialization, the catalog
    /// read-modify-write, and retirement of replaced image files — runs
    /// under the store's exclusive write lock, so two concurrent saves
    /// cannot lose each other's changes.
    ///
    /// Updates that submit a non-empty batch replace the record's image set
    /// and retire the files of dropped references; updates with an empty
    /// batch keep the stored images. Creates must end up with at least one
    /// reference.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Validation`] before any mutation;
    /// [`CatalogError::ImageWrite`] under strict image failures;
    /// [`CatalogError::StoreWrite`]/[`CatalogError::Encode`] when the
    /// catalog document cannot be replaced — image files already
    /// materialized for the failed save are left behind.
    pub async fn upsert(
        &self,
        draft: ProductDraft,
        uploads: Vec<ImageUpload>,
    ) -> Result<SaveOutcome, CatalogError> {
        validate_draft(&draft)?;
        if uploads.len() > self.config.max_images {
            return Err(ValidationError::TooManyImages {
                count: uploads.len(),
                max: self.config.max_images,
            }
            .into());
        }

        let _guard = self.write_lock.lock().await;

        let mut records = self.load().await;
        let now = Utc::now();

        let supplied_id = draft.id.as_deref().map(str::trim).filter(|id| !id.is_empty());
        let id = match supplied_id {
            Some(id) => id.to_string(),
            None => generate_product_id(now, |candidate| {
                records.iter().any(|record| record.id == candidate)
            }),
        };
        let position = records.iter().position(|record| record.id == id);

        let batch = materialize_batch(&self.config, &id, &uploads).await?;
        if position.is_none() && batch.refs.is_empty() {
            // Nothing was written: an empty or fully skipped batch never
            // reaches the filesystem.
            return Err(ValidationError::NoImages.into());
        }

        // validate_draft already guaranteed the price is present.
        let price = draft
            .price
            .ok_or(ValidationError::MissingField("price"))?;
        let sku = draft
            .sku
            .as_deref()
            .map(str::trim)
            .filter(|sku| !sku.is_empty())
            .map_or_else(|| generate_sku(now), ToOwned::to_owned);

        let record = match position {
            Some(position) => {
                let previous = &records[position];
                let images = if batch.refs.is_empty() {
                    previous.images.clone()
                } else {
                    retire_replaced(&self.config, &previous.images, &batch.refs).await;
                    batch.refs
                };
                let record = ProductRecord {
                    id,
                    name: draft.name.trim().to_string(),
                    description: draft.description.trim().to_string(),
                    category: draft.category.trim().to_string(),
                    price,
                    stock: draft.stock,
                    sku,
                    images,
                    created_at: previous.created_at,
                    saved_at: now,
                };
                records[position] = record.clone();
                record
            }
            None => {
                let record = ProductRecord {
                    id,
                    name: draft.name.trim().to_string(),
                    description: draft.description.trim().to_string(),
                    category: draft.category.trim().to_string(),
                    price,
                    stock: draft.stock,
                    sku,
                    images: batch.refs,
                    created_at: now,
                    saved_at: now,
                };
                records.push(record.clone());
                record
            }
        };

        self.persist(&records).await?;

        tracing::info!(
            product_id = %record.id,
            created = position.is_none(),
            images = record.images.len(),
            warnings = batch.warnings.len(),
            "product saved"
        );

        Ok(SaveOutcome {
            record,
            created: position.is_none(),
            warnings: batch.warnings,
        })
    }
}
