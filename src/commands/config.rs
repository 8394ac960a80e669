//! Configuration commands for managing Darshan settings.
//!
//! - `config show`: Display current configuration
//! - `config get`: Print a single value
//! - `config set`: Set a configuration value

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::{DarshanError, Result};

const SENSITIVE_KEYS: &[&str] = &["api.token"];

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let token_configured = config.api_token().is_some();

    let json_output = json!({
        "api": {
            "base_url": config.api_base_url(),
            "token_configured": token_configured,
            "timeout_secs": config.api.timeout_secs,
        },
        "listing": {
            "page_size": config.listing.page_size,
            "view_mode": config.listing.view_mode.to_string(),
            "debounce_ms": config.listing.debounce_ms,
        },
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));

    text_output.push_str(&format!("{}:\n", "api".cyan()));
    match config.api_base_url() {
        Some(url) => text_output.push_str(&format!("  base_url: {url}\n")),
        None => text_output.push_str(&format!("  base_url: {}\n", "not configured".dimmed())),
    }
    let token_status = if token_configured {
        "configured".green().to_string()
    } else {
        "not configured".dimmed().to_string()
    };
    text_output.push_str(&format!("  token: {token_status}\n"));
    text_output.push_str(&format!("  timeout_secs: {}\n", config.api.timeout_secs));

    text_output.push('\n');
    text_output.push_str(&format!("{}:\n", "listing".cyan()));
    text_output.push_str(&format!("  page_size: {}\n", config.listing.page_size));
    text_output.push_str(&format!("  view_mode: {}\n", config.listing.view_mode));
    text_output.push_str(&format!("  debounce_ms: {}\n", config.listing.debounce_ms));

    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    let sensitive = SENSITIVE_KEYS.contains(&key);
    let mut json_output = json!({
        "action": "config_set",
        "key": key,
        "success": true,
    });
    let text_output = if sensitive {
        format!("Set {}", key.cyan())
    } else {
        let stored = config.get(key)?.unwrap_or_default();
        json_output["value"] = json!(stored);
        format!("Set {} to {stored}", key.cyan())
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Get a specific configuration value
pub fn cmd_config_get(key: &str, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let value = config
        .get(key)?
        .ok_or_else(|| DarshanError::Config(format!("{key} not set")))?;

    let (json_output, text_output) = if SENSITIVE_KEYS.contains(&key) {
        let masked = mask_sensitive_value(&value);
        let json = json!({
            "key": key,
            "value": masked,
            "configured": true,
            "masked": true,
        });
        let text = format!("{masked} (masked - showing first 2 and last 2 characters)");
        (json, text)
    } else {
        let json = json!({
            "key": key,
            "value": value,
            "configured": true,
        });
        (json, value)
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive_value_ascii() {
        assert_eq!(mask_sensitive_value("abcdef"), "ab...ef");
        assert_eq!(mask_sensitive_value("12345678"), "12...78");
    }

    #[test]
    fn test_mask_sensitive_value_short() {
        assert_eq!(mask_sensitive_value("abcd"), "****");
        assert_eq!(mask_sensitive_value(""), "****");
    }

    #[test]
    fn test_mask_sensitive_value_multibyte_utf8() {
        assert_eq!(mask_sensitive_value("धर्मशाला"), "धर...ला");
    }
}
