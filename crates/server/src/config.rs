use std::path::{Path, PathBuf};

use genai::GenAiConfig;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_DATA_DIR: &str = ".planwise";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite file name, relative to the data directory
    pub database: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database: "planwise.db".to_string(),
        }
    }
}

/// Contents of `<data dir>/config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub genai: GenAiConfig,
}

impl AppConfig {
    /// Read the config from the data directory, falling back to defaults
    /// when the file is missing or unreadable
    pub async fn read(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            debug!(path = %config_path.display(), "Config file does not exist, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&config_path).await {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %config_path.display(), "Config loaded successfully");
                    config
                }
                Err(e) => {
                    warn!(path = %config_path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    /// Write the config into the data directory, creating it if needed
    pub async fn write(&self, data_dir: &Path) -> std::io::Result<()> {
        fs::create_dir_all(data_dir).await?;

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(data_dir.join(CONFIG_FILE), content).await?;

        debug!(path = %data_dir.display(), "Config saved");
        Ok(())
    }

    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.storage.database)
    }

    pub fn database_url(&self, data_dir: &Path) -> String {
        format!("sqlite:{}", self.database_path(data_dir).display())
    }
}
