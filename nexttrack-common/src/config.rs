//! Configuration loading and resolution
//!
//! Settings are resolved with ENV > TOML > default priority. The TOML
//! file lives at the platform config directory
//! (e.g. `~/.config/nexttrack/config.toml` on Linux).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable names honored by the resolver
pub const ENV_SPOTIFY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const ENV_CONTACT: &str = "NEXTTRACK_CONTACT";

/// TOML configuration file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Spotify application client id (Client Credentials flow)
    pub spotify_client_id: Option<String>,
    /// Spotify application client secret
    pub spotify_client_secret: Option<String>,
    /// Contact address included in the MusicBrainz User-Agent
    pub contact: Option<String>,
}

/// Resolved service configuration
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub contact: Option<String>,
}

impl ServiceConfig {
    /// Streaming-catalog credentials, if both halves are configured
    pub fn spotify_credentials(&self) -> Option<(String, String)> {
        match (&self.spotify_client_id, &self.spotify_client_secret) {
            (Some(id), Some(secret)) => Some((id.clone(), secret.clone())),
            _ => None,
        }
    }
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("nexttrack").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load the TOML configuration file, if present
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
    Ok(Some(config))
}

/// Resolve service configuration with ENV > TOML > default priority
///
/// Warns when a setting is present in multiple sources (potential
/// misconfiguration).
pub fn resolve_config(config_path: Option<&Path>) -> Result<ServiceConfig> {
    let toml_config = match config_path {
        Some(path) => load_toml_config(path)?,
        None => {
            let path = default_config_path()?;
            load_toml_config(&path)?
        }
    }
    .unwrap_or_default();

    Ok(ServiceConfig {
        spotify_client_id: resolve_setting(
            "spotify_client_id",
            ENV_SPOTIFY_CLIENT_ID,
            toml_config.spotify_client_id,
        ),
        spotify_client_secret: resolve_setting(
            "spotify_client_secret",
            ENV_SPOTIFY_CLIENT_SECRET,
            toml_config.spotify_client_secret,
        ),
        contact: resolve_setting("contact", ENV_CONTACT, toml_config.contact),
    })
}

/// Resolve one setting from ENV then TOML
fn resolve_setting(name: &str, env_var: &str, toml_value: Option<String>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_value(v));
    let toml_value = toml_value.filter(|v| is_valid_value(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML config. Using environment (highest priority).",
            name
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", name);
        return Some(value);
    }
    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", name);
        return Some(value);
    }
    None
}

/// Validate a setting value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}
