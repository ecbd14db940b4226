use serde::Serialize;
use thiserror::Error;

use mercurial_core::ValidationError;

/// Fatal failures of a catalog operation. Validation failures abort before
/// any storage mutation; write failures abort after image materialization,
/// and already-written image files are not rolled back.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to encode catalog document: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write catalog document at {path}: {source}")]
    StoreWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Only produced under strict image failures; otherwise a failed image
    /// write degrades to an inline reference and a warning.
    #[error("failed to store image at {path}: {source}")]
    ImageWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// `true` for errors the caller should report as bad input rather than
    /// a server-side failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogError::Validation(_))
    }
}

/// Non-fatal incidents of a save, returned alongside the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaveWarning {
    /// A batch entry was dropped; its sequence index is never reused.
    SkippedImage { index: usize, reason: SkipReason },
    /// The image could not be written to disk and was kept as an inline
    /// reference instead.
    DegradedToInline { index: usize, detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum SkipReason {
    /// Declared media type is not `image/*`.
    NotAnImage { media_type: String },
    /// Payload exceeds the configured per-image byte limit.
    TooLarge { size: u64, max: u64 },
    /// Payload could not be decoded at the transport boundary.
    Undecodable,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotAnImage { media_type } => {
                write!(f, "declared media type '{media_type}' is not an image")
            }
            SkipReason::TooLarge { size, max } => {
                write!(f, "payload of {size} bytes exceeds the {max}-byte limit")
            }
            SkipReason::Undecodable => write!(f, "payload could not be decoded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_flagged() {
        let err = CatalogError::from(ValidationError::MissingField("name"));
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "missing required field: name");
    }

    #[test]
    fn store_write_errors_are_not_validation() {
        let err = CatalogError::StoreWrite {
            path: "data/products.json".to_string(),
            source: std::io::Error::other("disk full"),
        };
        assert!(!err.is_validation());
    }

    #[test]
    fn warnings_serialize_with_tags() {
        let warning = SaveWarning::SkippedImage {
            index: 1,
            reason: SkipReason::TooLarge {
                size: 10,
                max: 5,
            },
        };
        let json = serde_json::to_value(&warning).expect("serialize");
        assert_eq!(json["kind"], "skipped_image");
        assert_eq!(json["reason"]["cause"], "too_large");
        assert_eq!(json["reason"]["max"], 5);
    }
}
