use crate::app_config::{AppConfig, StorageMode};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a recognized env var holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a recognized env var holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed. Every variable has a default; only invalid
/// values fail.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got '{other}'"),
            }),
        }
    };

    let bind_addr = parse_addr("MERCURIAL_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("MERCURIAL_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("MERCURIAL_DATA_DIR", "./data"));
    let images_dir = PathBuf::from(or_default("MERCURIAL_IMAGES_DIR", "./images"));

    let max_images = parse_usize("MERCURIAL_MAX_IMAGES", "5")?;
    let max_image_bytes = parse_u64("MERCURIAL_MAX_IMAGE_BYTES", "5242880")?;
    let raw_mode = or_default("MERCURIAL_STORAGE_MODE", "persisted");
    let storage_mode = parse_storage_mode("MERCURIAL_STORAGE_MODE", &raw_mode)?;
    let strict_image_failures = parse_bool("MERCURIAL_STRICT_IMAGE_FAILURES", "false")?;

    Ok(AppConfig {
        bind_addr,
        log_level,
        data_dir,
        images_dir,
        max_images,
        max_image_bytes,
        storage_mode,
        strict_image_failures,
    })
}

/// Parse a string into a `StorageMode`.
///
/// Unlike the numeric knobs there is no safe fallback for a typo here — a
/// misspelled mode silently choosing `persisted` would be wrong for a demo
/// deployment, so unknown values are rejected.
fn parse_storage_mode(var: &str, s: &str) -> Result<StorageMode, ConfigError> {
    match s {
        "persisted" => Ok(StorageMode::Persisted),
        "inline" => Ok(StorageMode::Inline),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected 'persisted' or 'inline', got '{other}'"),
        }),
    }
}
