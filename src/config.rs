use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Environment variables checked, in order, for the Gemini API key
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub model: String,
    pub lang: String,
    pub host: String,
    pub port: u16,
    pub api_base: String,
    /// Never read from the config file; attach with [`Config::with_api_key`]
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            lang: DEFAULT_LANG.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
        }
    }
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            Self::parse(&content)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }
}

/// Read the API key from the process environment
pub fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
model = "gemini-2.5-pro"
lang = "es"
host = "0.0.0.0"
port = 9000
api_base = "http://localhost:8080"
"#;
        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.lang, "es");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.api_base, "http://localhost:8080");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.lang, DEFAULT_LANG);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = Config::parse(r#"lang = "fr""#).unwrap();
        assert_eq!(config.lang, "fr");
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_api_key_is_not_read_from_file() {
        let config = Config::parse(r#"api_key = "secret""#).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_with_api_key_ignores_blank() {
        let config = Config::default().with_api_key(Some("  ".to_string()));
        assert!(config.api_key.is_none());
        let config = Config::default().with_api_key(Some("abc".to_string()));
        assert_eq!(config.api_key.as_deref(), Some("abc"));
    }
}
