//! Top-level application configuration.
//!
//! Configuration is stored in `.darshan/config.yaml` and includes:
//! - The REST backend base URL, optional API token and request timeout
//! - Listing defaults: page size, view mode and input debounce delay
//!
//! `DARSHAN_API_URL` and `DARSHAN_API_TOKEN` override the file values.

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DarshanError, Result};
use crate::query::DEFAULT_PAGE_SIZE;
use crate::types::DARSHAN_DIR;

/// Keys accepted by `config get` and `config set`
pub const CONFIG_KEYS: &[&str] = &[
    "api.base_url",
    "api.token",
    "api.timeout_secs",
    "listing.page_size",
    "listing.view_mode",
    "listing.debounce_ms",
];

/// Root directory for local state; `DARSHAN_ROOT` overrides the default `.darshan`.
pub fn darshan_root() -> PathBuf {
    match env::var("DARSHAN_ROOT") {
        Ok(root) if !root.is_empty() => PathBuf::from(root),
        _ => PathBuf::from(DARSHAN_DIR),
    }
}

/// How listings are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

enum_display_fromstr!(
    ViewMode,
    DarshanError::invalid_view_mode,
    {
        Grid => "grid",
        List => "list",
    }
);

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub listing: ListingConfig,
}

/// REST backend settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Listing defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub view_mode: ViewMode,

    /// Delay before input changes re-run the listing (default: 300)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            view_mode: ViewMode::default(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        darshan_root().join("config.yaml")
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            DarshanError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {e}", path.display()),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DarshanError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {e}",
                        parent.display()
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            DarshanError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {e}", path.display()),
            ))
        })?;

        // The file may hold an API token: owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.listing.page_size == 0 {
            return Err(DarshanError::Config(
                "listing.page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// API base URL from environment or config file
    pub fn api_base_url(&self) -> Option<String> {
        env_value("DARSHAN_API_URL").or_else(|| self.api.base_url.clone())
    }

    /// API token from environment or config file
    pub fn api_token(&self) -> Option<String> {
        env_value("DARSHAN_API_TOKEN").or_else(|| self.api.token.clone())
    }

    /// Value stored under `key`, as written in the config file
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "api.base_url" => self.api.base_url.clone(),
            "api.token" => self.api.token.clone(),
            "api.timeout_secs" => Some(self.api.timeout_secs.to_string()),
            "listing.page_size" => Some(self.listing.page_size.to_string()),
            "listing.view_mode" => Some(self.listing.view_mode.to_string()),
            "listing.debounce_ms" => Some(self.listing.debounce_ms.to_string()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Parse and store `value` under `key`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "api.base_url" => {
                url::Url::parse(value).map_err(|e| {
                    DarshanError::Config(format!("invalid value '{value}' for api.base_url: {e}"))
                })?;
                self.api.base_url = Some(value.to_string());
            }
            "api.token" => {
                self.api.token = (!value.is_empty()).then(|| value.to_string());
            }
            "api.timeout_secs" => {
                self.api.timeout_secs = parse_number(key, value)?;
                if self.api.timeout_secs == 0 {
                    return Err(DarshanError::Config(
                        "api.timeout_secs must be at least 1".to_string(),
                    ));
                }
            }
            "listing.page_size" => {
                let size: u32 = parse_number(key, value)?;
                if size == 0 {
                    return Err(DarshanError::Config(
                        "listing.page_size must be at least 1".to_string(),
                    ));
                }
                self.listing.page_size = size;
            }
            "listing.view_mode" => {
                self.listing.view_mode = value.parse().map_err(|_| {
                    DarshanError::Config(format!(
                        "invalid value '{value}' for listing.view_mode. Expected: {}",
                        ViewMode::ALL_STRINGS.join(", ")
                    ))
                })?;
            }
            "listing.debounce_ms" => {
                self.listing.debounce_ms = parse_number(key, value)?;
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N> {
    value
        .parse()
        .map_err(|_| DarshanError::Config(format!("invalid value '{value}' for {key}. Expected a number")))
}

fn unknown_key(key: &str) -> DarshanError {
    DarshanError::Config(format!(
        "unknown config key '{key}'. Valid keys: {}",
        CONFIG_KEYS.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.api.base_url.is_none());
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.listing.page_size, 12);
        assert_eq!(config.listing.view_mode, ViewMode::Grid);
        assert_eq!(config.listing.debounce_ms, 300);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
listing:
  view_mode: list
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.listing.view_mode, ViewMode::List);
        assert_eq!(config.listing.page_size, 12);
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.set("api.base_url", "https://example.org/api/").unwrap();
        config.set("listing.page_size", "9").unwrap();

        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let parsed: Config = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = Config::default();
        config.set("api.token", "tok_supersecret").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_set_validates_values() {
        let mut config = Config::default();
        assert!(config.set("listing.page_size", "0").is_err());
        assert!(config.set("listing.page_size", "many").is_err());
        assert!(config.set("listing.view_mode", "carousel").is_err());
        assert!(config.set("api.base_url", "not a url").is_err());
        assert!(config.set("api.timeout_secs", "0").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unknown_key() {
        let mut config = Config::default();
        let err = config.set("api.secret", "x").unwrap_err();
        assert!(err.to_string().contains("Valid keys"));
        assert!(config.get("listing.colour").is_err());
    }

    #[test]
    fn test_get_roundtrips_set() {
        let mut config = Config::default();
        config.set("listing.view_mode", "LIST").unwrap();
        assert_eq!(
            config.get("listing.view_mode").unwrap().as_deref(),
            Some("list")
        );
        assert_eq!(config.get("api.token").unwrap(), None);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config.set("api.base_url", "https://file.example/api/").unwrap();

        unsafe { std::env::set_var("DARSHAN_API_URL", "https://env.example/api/") };
        assert_eq!(
            config.api_base_url().as_deref(),
            Some("https://env.example/api/")
        );

        unsafe { std::env::set_var("DARSHAN_API_URL", "") };
        assert_eq!(
            config.api_base_url().as_deref(),
            Some("https://file.example/api/")
        );
        unsafe { std::env::remove_var("DARSHAN_API_URL") };
    }

    #[test]
    #[serial]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join(".darshan");
        unsafe { std::env::set_var("DARSHAN_ROOT", root.to_str().unwrap()) };

        assert_eq!(Config::load().unwrap(), Config::default());

        let mut config = Config::default();
        config.set("listing.debounce_ms", "150").unwrap();
        config.save().unwrap();
        assert!(root.join("config.yaml").exists());
        assert_eq!(Config::load().unwrap().listing.debounce_ms, 150);

        unsafe { std::env::remove_var("DARSHAN_ROOT") };
    }
}
