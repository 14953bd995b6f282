//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API base URL, the demo-mode flag and the last email used to log in.
//!
//! Configuration is stored at `~/.config/userdeck/config.json`. Environment
//! variables (also read from `.env`) override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "userdeck";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_BASE_URL: &str = "USERDECK_API_BASE_URL";
pub const ENV_DEMO_MODE: &str = "USERDECK_DEMO_MODE";
pub const ENV_EMAIL: &str = "USERDECK_EMAIL";
pub const ENV_PASSWORD: &str = "USERDECK_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub demo_mode: bool,
    pub last_email: Option<String>,
}

impl Config {
    /// Load the config file (defaults if missing) and apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = Some(url.trim().to_string());
        }
        if let Some(flag) = lookup(ENV_DEMO_MODE) {
            self.demo_mode = parse_flag(&flag);
        }
        if let Some(email) = lookup(ENV_EMAIL).filter(|v| !v.is_empty()) {
            self.last_email = Some(email);
        }
    }

    /// The configured API base URL. Required to talk to the server.
    pub fn api_base_url(&self) -> Result<&str> {
        self.api_base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No API base URL configured. Set {} or api_base_url in {}",
                    ENV_API_BASE_URL,
                    CONFIG_FILE
                )
            })
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session storage file and logs.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.demo_mode);
        assert!(config.api_base_url().is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config {
            api_base_url: Some("https://file.example".into()),
            demo_mode: true,
            last_email: Some("file@example.com".into()),
        };

        config.apply_overrides(lookup(&[
            (ENV_API_BASE_URL, " https://reqres.in/api "),
            (ENV_DEMO_MODE, "off"),
            (ENV_EMAIL, "env@example.com"),
        ]));

        assert_eq!(config.api_base_url().unwrap(), "https://reqres.in/api");
        assert!(!config.demo_mode);
        assert_eq!(config.last_email.as_deref(), Some("env@example.com"));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config {
            api_base_url: Some("https://file.example".into()),
            ..Default::default()
        };
        config.apply_overrides(lookup(&[(ENV_API_BASE_URL, "  "), (ENV_EMAIL, "")]));

        assert_eq!(config.api_base_url().unwrap(), "https://file.example");
        assert_eq!(config.last_email, None);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("nope"));
    }

    #[test]
    fn test_save_and_load_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            api_base_url: Some("https://reqres.in/api".into()),
            demo_mode: true,
            last_email: None,
        };

        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_older_file_without_demo_flag_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url": "https://x", "last_email": null}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.demo_mode);
    }
}
