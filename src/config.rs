//! # Configuration Management
//!
//! This module loads configuration from the hass-panel.toml file and then
//! applies `HA_*` environment overrides, so a deployment can keep the token out
//! of the file. It covers the hub connection, the three entity ids and the
//! display settings.

use crate::colour::Palette;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "hass-panel.toml";

/// Application configuration loaded from hass-panel.toml
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Home Assistant connection
    pub hub: HubConfig,
    /// Entities shown on the panel
    pub entities: EntityConfig,
    /// Display settings
    pub display: DisplayConfig,
}

/// Home Assistant hub connection settings
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct HubConfig {
    /// Use https instead of http
    pub ssl: bool,
    pub host: String,
    pub port: u16,
    /// Long-lived access token
    pub token: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Entity ids for the three panel values
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct EntityConfig {
    pub temperature: String,
    pub humidity: String,
    pub weather: String,
}

/// Display and output configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Panel width in pixels for the terminal preview
    pub width: u32,
    /// Panel height in pixels for the terminal preview
    pub height: u32,
    /// Colours the physical display can show
    pub palette: Palette,
    /// GPIO wiring of the e-paper HAT
    pub hardware: HardwareConfig,
}

/// GPIO pin numbers (BCM numbering) for the e-paper HAT
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub cs_pin: u32,
    pub dc_pin: u32,
    pub rst_pin: u32,
    pub busy_pin: u32,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            ssl: false,
            host: "localhost".to_string(),
            port: 8123,
            token: "invalid".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for EntityConfig {
    fn default() -> Self {
        EntityConfig {
            temperature: "sensor.temperature".to_string(),
            humidity: "sensor.humidity".to_string(),
            weather: "weather.home".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width: 250,  // Inky pHAT / 2.13" panels
            height: 122, // Inky pHAT / 2.13" panels
            palette: Palette::Red,
            hardware: HardwareConfig::default(),
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        HardwareConfig {
            cs_pin: 8,
            dc_pin: 25,
            rst_pin: 17,
            busy_pin: 24,
        }
    }
}

impl HubConfig {
    /// `{scheme}://{host}:{port}/api`
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}/api", scheme, self.host, self.port)
    }
}

impl Config {
    /// Hub API root, see [`HubConfig::base_url`].
    pub fn base_url(&self) -> String {
        self.hub.base_url()
    }

    /// Load configuration from hass-panel.toml, then apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::load_from_path(CONFIG_FILE);
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        "Loaded configuration from {}",
                        path.as_ref().display()
                    );
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Apply `HA_*` overrides from `lookup` (normally the process environment).
    ///
    /// Values that fail to parse are logged and skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("HA_SSL") {
            match parse_bool(&value) {
                Some(ssl) => self.hub.ssl = ssl,
                None => warn!("Ignoring HA_SSL={:?}: not a boolean", value),
            }
        }
        if let Some(value) = lookup("HA_HOST") {
            self.hub.host = value;
        }
        if let Some(value) = lookup("HA_PORT") {
            match value.trim().parse() {
                Ok(port) => self.hub.port = port,
                Err(_) => warn!("Ignoring HA_PORT={:?}: not a port number", value),
            }
        }
        if let Some(value) = lookup("HA_TOKEN") {
            self.hub.token = value;
        }
        if let Some(value) = lookup("HA_ENTITY_ID_TEMPERATURE") {
            self.entities.temperature = value;
        }
        if let Some(value) = lookup("HA_ENTITY_ID_HUMIDITY") {
            self.entities.humidity = value;
        }
        if let Some(value) = lookup("HA_ENTITY_ID_WEATHER") {
            self.entities.weather = value;
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" | "t" => Some(true),
        "0" | "false" | "no" | "n" | "off" | "f" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hub.host, "localhost");
        assert_eq!(config.hub.port, 8123);
        assert_eq!(config.hub.token, "invalid");
        assert_eq!(config.entities.temperature, "sensor.temperature");
        assert_eq!(config.entities.humidity, "sensor.humidity");
        assert_eq!(config.entities.weather, "weather.home");
        assert_eq!(config.display.palette, Palette::Red);
        assert_eq!(config.base_url(), "http://localhost:8123/api");
    }

    #[test]
    fn test_base_url_uses_https_with_ssl() {
        let mut config = Config::default();
        config.hub.ssl = true;
        config.hub.host = "hass.lan".to_string();
        config.hub.port = 443;
        assert_eq!(config.hub.base_url(), "https://hass.lan:443/api");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.hub.host, parsed.hub.host);
        assert_eq!(config.entities.weather, parsed.entities.weather);
        assert_eq!(config.display.palette, parsed.display.palette);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[hub]\nhost = \"10.0.0.2\"\n\n[display]\npalette = \"black\"\nwidth = 212"
        )
        .unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(config.hub.host, "10.0.0.2");
        assert_eq!(config.hub.port, 8123);
        assert_eq!(config.display.palette, Palette::Black);
        assert_eq!(config.display.width, 212);
        assert_eq!(config.display.height, 122);
        assert_eq!(config.display.hardware.busy_pin, 24);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is [not toml").unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(config.hub.host, "localhost");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        assert_eq!(config.entities.weather, "weather.home");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[
            ("HA_SSL", "True"),
            ("HA_HOST", "hass.local"),
            ("HA_PORT", "8443"),
            ("HA_TOKEN", "abc123"),
            ("HA_ENTITY_ID_TEMPERATURE", "sensor.office_temperature"),
            ("HA_ENTITY_ID_HUMIDITY", "sensor.office_humidity"),
            ("HA_ENTITY_ID_WEATHER", "weather.forecast_home"),
        ]));

        assert!(config.hub.ssl);
        assert_eq!(config.hub.token, "abc123");
        assert_eq!(config.hub.base_url(), "https://hass.local:8443/api");
        assert_eq!(config.entities.temperature, "sensor.office_temperature");
        assert_eq!(config.entities.humidity, "sensor.office_humidity");
        assert_eq!(config.entities.weather, "weather.forecast_home");
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(lookup_from(&[("HA_SSL", "maybe"), ("HA_PORT", "http")]));
        assert!(!config.hub.ssl);
        assert_eq!(config.hub.port, 8123);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool(" 1 "), Some(true));
        assert_eq!(parse_bool("FALSE"), Some(false));
        assert_eq!(parse_bool("2"), None);
    }
}
