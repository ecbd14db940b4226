pub mod app_config;
pub mod config;
pub mod image;
pub mod product;

use thiserror::Error;

pub use app_config::{AppConfig, StorageMode};
pub use config::{load_app_config, load_app_config_from_env};
pub use image::{extension_for, ImageRef, ImageUpload};
pub use product::{
    generate_product_id, generate_sku, validate_draft, ProductDraft, ProductRecord,
    ValidationError,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
