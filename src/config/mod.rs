//! Typed configuration loaded from `data/config.toml`
//!
//! ```ignore
//! use tokenscout::config::{load_config_from_path, with_config};
//!
//! load_config_from_path(&tokenscout::paths::get_config_path())?;
//! let limit = with_config(|cfg| cfg.scanner.batch_limit);
//! ```

pub mod macros;
mod schemas;
mod utils;

pub use schemas::*;
pub use utils::{
    apply_env_overrides, load_config_from_path, read_config_file,
    validate_endpoints, with_config,
};
