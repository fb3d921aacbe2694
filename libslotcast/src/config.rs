//! Configuration management for Slotcast

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    pub mastodon: Option<MastodonConfig>,
    pub linkedin: Option<LinkedInConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Seconds between dispatch ticks
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MastodonConfig {
    pub enabled: bool,
    /// Instance host or URL, e.g. "mastodon.social"
    pub instance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInConfig {
    pub enabled: bool,
    #[serde(default = "default_linkedin_api_base")]
    pub api_base: String,
}

fn default_linkedin_api_base() -> String {
    "https://api.linkedin.com".to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/slotcast/queue.db".to_string(),
            },
            dispatch: DispatchConfig::default(),
            mastodon: Some(MastodonConfig {
                enabled: true,
                instance: "mastodon.social".to_string(),
            }),
            linkedin: Some(LinkedInConfig {
                enabled: true,
                api_base: default_linkedin_api_base(),
            }),
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SLOTCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("slotcast").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.dispatch.poll_interval, 60);
        assert!(config.mastodon.is_some());
        assert!(config.linkedin.is_some());
    }

    #[test]
    fn test_load_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\npath = \":memory:\"").unwrap();

        let config = Config::load_from_path(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.database.path, ":memory:");
        // Omitted sections fall back to defaults / absent
        assert_eq!(config.dispatch.poll_interval, 60);
        assert!(config.mastodon.is_none());
        assert!(config.linkedin.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[database]
path = "/tmp/slotcast.db"

[dispatch]
poll_interval = 30

[mastodon]
enabled = true
instance = "fosstodon.org"

[linkedin]
enabled = false
"#
        )
        .unwrap();

        let config = Config::load_from_path(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.dispatch.poll_interval, 30);
        assert_eq!(config.mastodon.unwrap().instance, "fosstodon.org");

        let linkedin = config.linkedin.unwrap();
        assert!(!linkedin.enabled);
        assert_eq!(linkedin.api_base, "https://api.linkedin.com");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load_from_path(&PathBuf::from("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[").unwrap();

        let result = Config::load_from_path(&file.path().to_path_buf());
        assert!(result.is_err());
    }
}
