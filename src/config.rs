use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the answer service
    pub endpoint: String,

    /// ImmoGPT home directory (config file and logs live here)
    #[serde(skip)]
    pub immogpt_home: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub title: String,
    pub tagline: String,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            endpoint: "http://127.0.0.1:8000".to_string(),
            immogpt_home: home.join(".immogpt"),
            ui: UiConfig {
                title: "ImmoGPT".to_string(),
                tagline: "Search your dream house, ask for prices, market trends using natural language."
                    .to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from ~/.immogpt/config.toml, creating the directory
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Self::load_from(home.join(".immogpt"))
    }

    /// Load configuration rooted at a specific home directory
    pub fn load_from(immogpt_home: PathBuf) -> Result<Self> {
        fs::create_dir_all(&immogpt_home).context("Failed to create .immogpt directory")?;

        let config_path = immogpt_home.join("config.toml");
        let mut config = if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.immogpt_home = immogpt_home;
        Ok(config)
    }

    /// Save configuration to file
    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        let config_path = self.immogpt_home.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("home")).unwrap();

        assert_eq!(config.endpoint, "http://127.0.0.1:8000");
        assert_eq!(config.ui.title, "ImmoGPT");
        assert!(config.immogpt_home.ends_with("home"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from(dir.path().to_path_buf()).unwrap();
        config.endpoint = "http://10.0.0.5:9000".to_string();
        config.ui.title = "HouseBot".to_string();
        config.save().unwrap();

        let reloaded = Config::load_from(dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.endpoint, "http://10.0.0.5:9000");
        assert_eq!(reloaded.ui.title, "HouseBot");
    }
}
