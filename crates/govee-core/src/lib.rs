//! Govee BLE Light Control Core
//!
//! This crate discovers Govee lights from BLE advertisements, classifies them
//! by model, keeps a registry of known devices and encodes the 20-byte command
//! frames used to switch, dim and color them.
//!
//! ## Architecture
//!
//! - [`classifier`] - model extraction from advertised names
//! - [`frame`] - command frame encoding and checksum
//! - [`device`] - device identity, capability variants and LED control
//! - [`registry`] - address-keyed device registry
//! - [`events`] - synchronous topic-based event bus
//! - [`scanner`] - advertisement dispatch and one-shot lookups
//! - [`transport`] - traits implemented by radio backends
//!
//! The radio itself lives behind [`AdvertisementSource`] and
//! [`CommandTransport`]; `govee-ble` provides a btleplug implementation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use govee_core::{Scanner, DEVICE_DISCOVERED};
//!
//! # async fn example(radio: Arc<impl govee_core::AdvertisementSource + govee_core::CommandTransport + 'static>) -> govee_core::Result<()> {
//! let scanner = Scanner::new(radio);
//! scanner.on(DEVICE_DISCOVERED, |event| println!("found {}", event.device));
//! scanner.start().await?;
//!
//! if let Some(device) = scanner.find_device("A4:C1:38:12:34:56").await? {
//!     if let Some(light) = device.as_led_light() {
//!         light.turn_on().await?;
//!         light.set_color(255, 120, 0).await?;
//!     }
//! }
//!
//! scanner.stop().await?;
//! # Ok(())
//! # }
//! ```

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod advertisement;
pub mod classifier;
pub mod config;
pub mod device;
pub mod errors;
pub mod events;
pub mod frame;
pub mod registry;
pub mod scanner;
pub mod transport;

mod sync;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use advertisement::Advertisement;
pub use classifier::model_from_name;
pub use config::ScannerConfig;
pub use device::{
    classify, Classification, CommandGate, Device, DeviceKind, DeviceSnapshot, DeviceVariant,
    LedLight, LightState, MODEL_TABLE,
};
pub use errors::{GoveeError, Result, TransportError};
pub use events::{DeviceEvent, EventBus, Subscription, DEVICE_DISCOVERED};
pub use frame::{
    encode_brightness_frame, encode_color_frame, encode_power_frame, Color, Command, Frame,
    COMMAND_CHARACTERISTIC_UUID, FRAME_LEN,
};
pub use registry::Registry;
pub use scanner::Scanner;
pub use transport::{AdvertisementSink, AdvertisementSource, CommandTransport, SessionId};
