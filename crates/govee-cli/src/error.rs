//! Error handling for the govee CLI

use thiserror::Error;

use crate::config::ConfigError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Govee core error: {0}")]
    Core(#[from] govee_core::GoveeError),

    #[error("BLE transport error: {0}")]
    Ble(#[from] govee_ble::BleTransportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No supported light found at {address}")]
    DeviceNotFound { address: String },

    #[error("{address} is not a controllable light")]
    NotControllable { address: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
