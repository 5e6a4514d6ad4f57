use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    #[serde(default)]
    pub ws_token: Option<String>,

    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    #[serde(default = "default_refresh_delay")]
    pub recordings_refresh_delay_ms: u64,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_refresh_delay() -> u64 {
    1500
}

fn default_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_path: default_ws_path(),
            ws_token: None,
            reconnect_delay_secs: default_reconnect_delay(),
            recordings_refresh_delay_ms: default_refresh_delay(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/nixon-panel/config.json)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("nixon-panel").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("base_url is not a valid URL: {}", self.base_url))?;

        if !["http", "https"].contains(&url.scheme()) {
            return Err(anyhow::anyhow!("base_url must use http or https"));
        }

        if !self.ws_path.starts_with('/') {
            return Err(anyhow::anyhow!("ws_path must start with '/'"));
        }

        if self.reconnect_delay_secs == 0 {
            return Err(anyhow::anyhow!("reconnect_delay_secs must be at least 1"));
        }

        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn recordings_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.recordings_refresh_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// WebSocket endpoint derived from `base_url`, carrying the token as a query parameter.
    pub fn ws_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("base_url is not a valid URL: {}", self.base_url))?;

        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| anyhow::anyhow!("Cannot derive WebSocket scheme from {}", self.base_url))?;
        url.set_path(&self.ws_path);
        url.set_query(None);

        if let Some(token) = self.ws_token.as_deref().filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair("token", token);
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            base_url: "ftp://nixon.local".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            ws_path: "ws".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            reconnect_delay_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ws_url() {
        let config = Config {
            base_url: "https://nixon.local:8443/".to_string(),
            ws_token: Some("s3cret".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.ws_url().unwrap().as_str(),
            "wss://nixon.local:8443/ws?token=s3cret"
        );

        let config = Config::default();
        assert_eq!(config.ws_url().unwrap().as_str(), "ws://localhost:8080/ws");
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let file = tempfile::Builder::new()
            .prefix("nixon-panel-")
            .suffix(".json")
            .tempfile()
            .unwrap();
        std::fs::write(file.path(), r#"{"base_url": "http://10.0.0.5:9000"}"#).unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.ws_path, "/ws");
        assert_eq!(config.recordings_refresh_delay_ms, 1500);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            ws_token: Some("abc".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.ws_token.as_deref(), Some("abc"));
    }
}
