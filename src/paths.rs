//! Centralized path resolution for tokenscout
//!
//! Everything lives under one base directory, the current working directory
//! unless `TOKENSCOUT_HOME` points elsewhere:
//!
//! ```text
//! <base>/
//! ├── data/
//! │   ├── config.toml
//! │   └── tokens.db
//! └── logs/
//!     └── tokenscout_*.log
//! ```

use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

const HOME_ENV: &str = "TOKENSCOUT_HOME";

static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(|| match std::env::var(HOME_ENV) {
    Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
    _ => PathBuf::from("."),
});

pub fn get_base_directory() -> &'static Path {
    BASE_DIRECTORY.as_path()
}

pub fn get_data_dir() -> PathBuf {
    get_base_directory().join("data")
}

pub fn get_logs_dir() -> PathBuf {
    get_base_directory().join("logs")
}

pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Relative paths are taken from the base directory
pub fn resolve(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        get_base_directory().join(path)
    }
}

/// Create the data and logs directories if missing
pub fn ensure_all_directories() -> Result<(), String> {
    for dir in [get_data_dir(), get_logs_dir()] {
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
    }
    Ok(())
}
