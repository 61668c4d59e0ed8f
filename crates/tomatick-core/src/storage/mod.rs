mod config;
pub mod database;

pub use config::{Config, SyncConfig};
pub use database::{Database, Stats};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns `~/.config/tomatick[-dev]/` based on TOMATICK_ENV.
///
/// Set TOMATICK_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TOMATICK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tomatick-dev")
    } else {
        base_dir.join("tomatick")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
