/// Configuration loading and access helpers
///
/// The global `CONFIG` is filled once at startup by `load_config_from_path`.
/// Long-lived services take a `Config` clone at construction time instead of
/// reading the global on every call.
use super::schemas::Config;
use crate::logger::{self, LogTag};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::RwLock;
use url::Url;

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Parse a TOML file, or return defaults when the file does not exist
pub fn read_config_file(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path.display()),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

    toml::from_str::<Config>(&contents)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))
}

/// Apply secrets and endpoints from the environment (and `.env`)
///
/// Only non-empty variables override the file values.
pub fn apply_env_overrides(config: &mut Config) {
    let _ = dotenv::dotenv();
    apply_env_from(config, |key| std::env::var(key).ok());
}

pub(crate) fn apply_env_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = get("HELIUS_API_KEY") {
        config.apis.helius_api_key = Some(key);
    }
    if let Some(key) = get("BIRDEYE_API_KEY") {
        config.apis.birdeye_api_key = Some(key);
    }
    if let Some(key) = get("SOLSCAN_API_KEY") {
        config.apis.solscan_api_key = Some(key);
    }
    if let Some(url) = get("RPC_URL") {
        config.apis.rpc_url = url;
    }
    if let Some(url) = get("RPC_WS_URL") {
        config.apis.rpc_ws_url = url;
    }
}

/// Reject endpoints that do not parse or use the wrong scheme
pub fn validate_endpoints(config: &Config) -> Result<(), String> {
    let apis = &config.apis;
    let http = [
        ("apis.jupiter_token_list_url", &apis.jupiter_token_list_url),
        ("apis.jupiter_quote_url", &apis.jupiter_quote_url),
        ("apis.dexscreener_base_url", &apis.dexscreener_base_url),
        ("apis.rugcheck_base_url", &apis.rugcheck_base_url),
        ("apis.solscan_base_url", &apis.solscan_base_url),
        ("apis.birdeye_base_url", &apis.birdeye_base_url),
        ("apis.rpc_url", &apis.rpc_url),
    ];

    for (name, value) in http {
        check_scheme(name, value, &["http", "https"])?;
    }
    check_scheme("apis.rpc_ws_url", &apis.rpc_ws_url, &["ws", "wss"])
}

fn check_scheme(name: &str, value: &str, schemes: &[&str]) -> Result<(), String> {
    let parsed = Url::parse(value).map_err(|e| format!("Invalid {} '{}': {}", name, value, e))?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(format!(
            "Invalid {} '{}': expected scheme {}",
            name,
            value,
            schemes.join(" or ")
        ));
    }
    Ok(())
}

/// Load configuration from disk, apply env overrides and initialize the global
pub fn load_config_from_path(path: &Path) -> Result<Config, String> {
    let mut config = read_config_file(path)?;
    apply_env_overrides(&mut config);
    validate_endpoints(&config)?;

    match CONFIG.get() {
        Some(lock) => {
            let mut current = lock
                .write()
                .map_err(|e| format!("Failed to acquire config write lock: {}", e))?;
            *current = config.clone();
        }
        None => {
            CONFIG
                .set(RwLock::new(config.clone()))
                .map_err(|_| "Config already initialized".to_string())?;
        }
    }

    logger::debug(
        LogTag::Config,
        &format!("Configuration loaded from {}", path.display()),
    );
    Ok(config)
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when nothing has been loaded yet.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    let lock = CONFIG.get_or_init(|| RwLock::new(Config::default()));
    match lock.read() {
        Ok(config) => f(&config),
        Err(poisoned) => f(&poisoned.into_inner()),
    }
}
