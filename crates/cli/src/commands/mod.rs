pub mod ask;
pub mod doctor;
pub mod explain;
pub mod index;
pub mod onboard;
pub mod serve;
pub mod status;

use compass_config::AppConfig;
use compass_core::{DeploymentMode, Profile};
use std::path::Path;

/// Load the config and apply a command-line mode override.
pub fn load_config(mode: Option<DeploymentMode>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(mode) = mode {
        config.mode = mode;
    }
    Ok(config)
}

/// Read a caller profile from a JSON file.
pub fn load_profile(path: Option<&Path>) -> Result<Option<Profile>, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read profile {}: {e}", path.display()))?;
    let profile: Profile = serde_json::from_str(&raw)
        .map_err(|e| format!("Invalid profile {}: {e}", path.display()))?;
    Ok(Some(profile))
}
