//! Govee CLI configuration
//!
//! Configuration is read from a TOML file. Every section and field is
//! optional; anything missing falls back to its default.
//!
//! ```toml
//! [ble]
//! adapter_index = 0
//! write_with_response = false
//!
//! [cli]
//! scan_duration_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use govee_ble::BleTransportConfig;
use govee_core::ScannerConfig;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the govee CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// BLE transport configuration
    pub ble: BleTransportConfig,
    /// Scanner configuration
    pub scanner: ScannerConfig,
    /// CLI-specific configuration
    pub cli: CliConfig,
}

/// CLI-specific configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// How long `scan` runs when no duration is given
    pub scan_duration_secs: u64,
    /// Print JSON instead of text
    pub json_output: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            scan_duration_secs: 10,
            json_output: false,
        }
    }
}

impl CliConfig {
    pub fn scan_duration(&self) -> Duration {
        Duration::from_secs(self.scan_duration_secs)
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileSystem(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the per-user configuration file if one exists
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_config_path() {
            Some(path) if path.is_file() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/govee/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("govee").join("config.toml"))
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scanner.find_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "Lookup timeout must be greater than 0".to_string(),
            ));
        }

        if self.ble.connection_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "BLE connection timeout must be greater than 0".to_string(),
            ));
        }

        if self.cli.scan_duration_secs == 0 {
            return Err(ConfigError::Validation(
                "Scan duration must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        let example_config = AppConfig {
            cli: CliConfig {
                scan_duration_secs: 30,
                json_output: false,
            },
            ..Default::default()
        };

        toml::to_string_pretty(&example_config)
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("File system error: {0}")]
    FileSystem(String),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();
        assert_eq!(config.cli.scan_duration(), Duration::from_secs(10));
        assert_eq!(config.scanner.find_timeout, Duration::from_secs(10));
        assert_eq!(config.ble.adapter_index, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.cli.scan_duration_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.scanner.find_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ble.connection_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [ble]
            adapter_index = 1

            [cli]
            json_output = true
            "#,
        )
        .unwrap();

        assert_eq!(config.ble.adapter_index, 1);
        assert!(config.cli.json_output);
        assert_eq!(config.cli.scan_duration_secs, 10);
        assert_eq!(config.scanner, ScannerConfig::default());
    }

    #[test]
    fn test_example_config_round_trips() {
        let example = AppConfig::example_config();
        assert!(example.contains("[ble]"));
        assert!(example.contains("[cli]"));

        let parsed: AppConfig = toml::from_str(&example).unwrap();
        assert_eq!(parsed.cli.scan_duration_secs, 30);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = AppConfig::load_from_file("/nonexistent/govee.toml");
        assert!(matches!(result, Err(ConfigError::FileSystem(_))));
    }
}
