use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::image::ImageRef;

/// A product as it lives in the catalog document.
///
/// Field names are the storefront's wire format: the catalog document is
/// consumed directly by the shop pages, so renames here are breaking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Unique within the catalog; a millisecond-timestamp string for
    /// generated ids, e.g. `"1714501933842"`.
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Stored as a JSON number, e.g. `19.99`.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    /// Merchant SKU; generated as `"ST-<millis>"` when the form left it blank.
    pub sku: String,
    /// Ordered image references for the storefront gallery.
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

/// A candidate record as submitted by the admin form, before validation,
/// id/SKU assignment, and image materialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    /// Present when editing an existing product; blank/absent on create.
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Option<Decimal>,
    /// Lenient: numbers and numeric strings are accepted, anything else is 0.
    #[serde(deserialize_with = "de_stock")]
    pub stock: u32,
    pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("price must not be negative")]
    NegativePrice,
    #[error("too many images: got {count}, maximum is {max}")]
    TooManyImages { count: usize, max: usize },
    #[error("at least one image is required")]
    NoImages,
}

/// Check the required fields of a draft, in the order the admin form checks
/// them: `name`, `price`, `description`, `category`.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] naming the first blank/absent
/// required field, or [`ValidationError::NegativePrice`].
pub fn validate_draft(draft: &ProductDraft) -> Result<(), ValidationError> {
    if draft.name.trim().is_empty() {
        return Err(ValidationError::MissingField("name"));
    }
    let price = draft.price.ok_or(ValidationError::MissingField("price"))?;
    if draft.description.trim().is_empty() {
        return Err(ValidationError::MissingField("description"));
    }
    if draft.category.trim().is_empty() {
        return Err(ValidationError::MissingField("category"));
    }
    if price.is_sign_negative() {
        return Err(ValidationError::NegativePrice);
    }
    Ok(())
}

/// Generate a fresh product id: milliseconds since epoch, incremented past
/// any id the `taken` predicate claims, so two same-millisecond creates can
/// never collapse into one record.
#[must_use]
pub fn generate_product_id(now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let mut candidate = now.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if !taken(&id) {
            return id;
        }
        candidate += 1;
    }
}

/// Generate a fallback SKU for drafts that left the field blank.
#[must_use]
pub fn generate_sku(now: DateTime<Utc>) -> String {
    format!("ST-{}", now.timestamp_millis())
}

// parseInt-style leniency: the original form fell back to 0 for anything it
// could not read as a non-negative integer.
fn de_stock<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(lenient_stock(&value))
}

fn lenient_stock(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                u32::try_from(v).unwrap_or(0)
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f >= 0.0 {
                    f as u32
                } else {
                    0
                }
            } else {
                0
            }
        }
        serde_json::Value::String(s) => s.trim().parse::<u32>().unwrap_or(0),
        _ => 0,
    }
}
