use drive_core::ServiceAccountKey;
use serde::Deserialize;
use thiserror::Error;

/// Local settings file of the game client; policy-exempt, never synced.
pub const CONFIG_FILE_NAME: &str = "driveup.cfg";

// Replaced with the real deployment blob when the updater is packaged.
static BUNDLED: &[u8] = include_bytes!("../config.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bundled config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub root_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub max_parallel: Option<usize>,
}

impl AppConfig {
    pub fn root_override(&self) -> Option<&str> {
        self.root_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// One bundled blob carries both the service-account key and the app
/// fields; it is deserialized twice, once per concern.
pub fn load_bundled() -> Result<(AppConfig, ServiceAccountKey), ConfigError> {
    let app = serde_json::from_slice::<AppConfig>(BUNDLED)?;
    let key = serde_json::from_slice::<ServiceAccountKey>(BUNDLED)?;
    Ok((app, key))
}
