use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::{MarketError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Admin email baked in at build time, overridable at runtime
pub const BUILD_ADMIN_EMAIL: &str = match option_env!("ESTATE_ADMIN_EMAIL") {
    Some(email) => email,
    None => "admin@estate.local",
};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub admin_email: String,
    pub session_file: PathBuf,
    pub timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        let session_file = match var("ESTATE_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => {
                let path = default_session_file()?;
                info!("ESTATE_SESSION_FILE not set, using default: {}", path.display());
                path
            }
        };

        Ok(Self {
            api_base_url: try_load("ESTATE_API_URL", DEFAULT_API_URL)?,
            admin_email: try_load("ESTATE_ADMIN_EMAIL", BUILD_ADMIN_EMAIL)?,
            session_file,
            timeout: Duration::from_secs(try_load("ESTATE_TIMEOUT_SECS", "30")?),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            MarketError::Config(format!("invalid {key}: {e}"))
        })
}

fn default_session_file() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| MarketError::Config("no config directory found".to_string()))?;
    Ok(base.join("estate-market").join("session.json"))
}
