//! Bluetooth Low Energy transport for Govee lights
//!
//! This crate implements the radio traits from `govee-core` on top of
//! btleplug, so a [`govee_core::Scanner`] can discover and drive real lights.
//!
//! ## Architecture
//!
//! - [`config`] - Transport configuration and settings
//! - [`error`] - Error types specific to BLE transport
//! - [`protocol`] - Peripheral data to advertisement conversion
//! - [`discovery`] - Adapter setup and reference-counted scan sessions
//! - [`connection`] - Scoped connect/write/disconnect per command
//! - [`transport`] - Main transport implementation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use govee_ble::{BleTransport, BleTransportConfig};
//! use govee_core::Scanner;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BleTransportConfig::new().with_adapter_index(0);
//! let transport = Arc::new(BleTransport::with_config(config).await?);
//!
//! let scanner = Scanner::new(transport);
//! scanner.on_discovered(|event| println!("found {}", event.device));
//! scanner.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod transport;

// Public API exports
pub use config::BleTransportConfig;
pub use error::BleTransportError;
pub use protocol::{advertisement_from_properties, peripheral_address};
pub use transport::BleTransport;

// Re-export core traits for convenience
pub use govee_core::{AdvertisementSource, CommandTransport};
