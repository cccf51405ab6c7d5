use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::AppConfig;

const DATA_DIR: &str = ".terminology_proxy";
const CONFIG_FILE: &str = "config.json";
const CONFIG_PATH_ENV: &str = "TERMINOLOGY_PROXY_CONFIG";

/// Get data directory path (logs and the default config file live here)
pub fn get_data_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Failed to get user home directory".to_string()))?;
    let data_dir = home.join(DATA_DIR);

    // Ensure directory exists
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

/// Load `.env` from the working directory (or a parent) into the process environment
///
/// Runs before the logger is installed so `RUST_LOG` from `.env` takes effect.
/// Variables already set in the environment win.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Load a specific `.env` file into the process environment
pub fn load_dotenv_from(path: &Path) -> AppResult<()> {
    dotenvy::from_path(path)
        .map_err(|e| AppError::Config(format!("Failed to load {:?}: {}", path, e)))
}

/// Load application config
///
/// Reads the JSON config file, then applies environment overrides. Call
/// `load_dotenv` first so `.env` values are visible here.
pub fn load_app_config() -> AppResult<AppConfig> {
    let config_path = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => PathBuf::from(path),
        Err(_) => get_data_dir()?.join(CONFIG_FILE),
    };

    let config = load_config_file(&config_path)?;
    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// Read a JSON config file, falling back to defaults when it does not exist
pub fn load_config_file(path: &Path) -> AppResult<AppConfig> {
    if !path.exists() {
        tracing::info!("No config file at {:?}, using defaults", path);
        return Ok(AppConfig::new());
    }

    let content = fs::read_to_string(path)?;

    serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
}

/// Overlay environment-sourced values on top of a loaded config
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(username) = lookup("TERMINOLOGY_USERNAME") {
        config.auth.username = username;
    }
    if let Some(password) = lookup("TERMINOLOGY_PASSWORD") {
        config.auth.password = password;
    }
    if let Some(issuer) = lookup("TERMINOLOGY_ISSUER") {
        config.auth.issuer = issuer;
    }
    if let Some(base_url) = lookup("TERMINOLOGY_BASE_URL") {
        config.proxy.terminology_base_url = base_url;
    }
    if let Some(port) = lookup("TERMINOLOGY_PROXY_PORT") {
        match port.parse() {
            Ok(port) => config.proxy.port = port,
            Err(e) => tracing::warn!("Ignoring invalid TERMINOLOGY_PROXY_PORT {}: {}", port, e),
        }
    }
    config
}
