//! Device identity, capability variants and LED control
//!
//! A [`Device`] is created once per address when an advertisement classifies
//! to a supported model. Its address and model never change afterwards; the
//! advertised name, RSSI and manufacturer data are refreshed by
//! [`Device::update`].
//!
//! Light state (`on`, `brightness`, `color`) is a cache of the last command
//! that succeeded. Nothing is inferred from advertisements.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::advertisement::Advertisement;
use crate::classifier::model_from_name;
use crate::errors::Result;
use crate::frame::{Color, Command, COMMAND_CHARACTERISTIC_UUID};
use crate::sync::{lock, read, write};
use crate::transport::CommandTransport;

// ----------------------------------------------------------------------------
// Model Table
// ----------------------------------------------------------------------------

/// Capability variants that have a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceVariant {
    LedLight,
}

/// Models with a handler, resolved at compile time
pub const MODEL_TABLE: &[(&str, DeviceVariant)] = &[("H6170", DeviceVariant::LedLight)];

/// Outcome of classifying an advertised name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Not a (well-formed) Govee name
    NotGovee,
    /// Govee name whose model has no handler
    Unsupported { model: &'a str },
    /// Govee name with a handler variant
    Supported {
        model: &'a str,
        variant: DeviceVariant,
    },
}

/// Classify an advertised name against the model table
pub fn classify(name: Option<&str>) -> Classification<'_> {
    let Some(model) = model_from_name(name) else {
        return Classification::NotGovee;
    };

    MODEL_TABLE
        .iter()
        .find(|(supported, _)| *supported == model)
        .map(|(_, variant)| Classification::Supported {
            model,
            variant: *variant,
        })
        .unwrap_or(Classification::Unsupported { model })
}

// ----------------------------------------------------------------------------
// Command Gate
// ----------------------------------------------------------------------------

/// Per-address command locks shared by every device a scanner hands out
///
/// Most peripherals accept a single connection, so commands to one address
/// are queued (FIFO, tokio mutex fairness) and never overlap. Different
/// addresses proceed independently.
#[derive(Debug, Default)]
pub struct CommandGate {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CommandGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock for `address`; addresses compare case-insensitively
    pub fn lock_for(&self, address: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = lock(&self.locks);
        locks
            .entry(address.to_ascii_lowercase())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

/// Serialized path from a device to the command transport
struct CommandLink {
    address: String,
    transport: Arc<dyn CommandTransport>,
    lock: Arc<AsyncMutex<()>>,
}

impl CommandLink {
    /// Write `command`, then run `on_sent` before the address lock is released
    async fn send<F>(&self, command: Command, on_sent: F) -> Result<()>
    where
        F: FnOnce(),
    {
        // Validation errors surface before queueing behind other commands
        let frame = command.encode()?;

        let _guard = self.lock.lock().await;
        debug!("Writing {:?} to {}: {:?}", command, self.address, frame);
        self.transport
            .write_command(&self.address, COMMAND_CHARACTERISTIC_UUID, &frame)
            .await?;
        on_sent();
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// LED Light
// ----------------------------------------------------------------------------

/// Last commanded state of an LED light; `None` means never commanded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    pub on: Option<bool>,
    /// Percent, 0..=100
    pub brightness: Option<u8>,
    pub color: Option<Color>,
}

/// RGB LED light (H6170)
pub struct LedLight {
    link: CommandLink,
    state: RwLock<LightState>,
}

impl LedLight {
    fn new(link: CommandLink) -> Self {
        Self {
            link,
            state: RwLock::new(LightState::default()),
        }
    }

    pub fn state(&self) -> LightState {
        *read(&self.state)
    }

    pub fn is_on(&self) -> bool {
        self.state().on == Some(true)
    }

    pub fn brightness(&self) -> Option<u8> {
        self.state().brightness
    }

    pub fn color(&self) -> Option<Color> {
        self.state().color
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.set_power(true).await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.set_power(false).await
    }

    pub async fn set_power(&self, on: bool) -> Result<()> {
        self.link
            .send(Command::Power(on), || write(&self.state).on = Some(on))
            .await
    }

    pub async fn set_color(&self, red: u8, green: u8, blue: u8) -> Result<()> {
        let color = Color::new(red, green, blue);
        self.link
            .send(Command::Color(color), || write(&self.state).color = Some(color))
            .await
    }

    /// Set brightness in percent; values above 100 are rejected without I/O
    pub async fn set_brightness(&self, percent: u8) -> Result<()> {
        self.link
            .send(Command::Brightness(percent), || {
                write(&self.state).brightness = Some(percent)
            })
            .await
    }
}

impl fmt::Debug for LedLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedLight")
            .field("address", &self.link.address)
            .field("state", &self.state())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Device
// ----------------------------------------------------------------------------

/// Capability-specific part of a device
#[derive(Debug)]
pub enum DeviceKind {
    LedLight(LedLight),
}

impl DeviceKind {
    pub fn variant(&self) -> DeviceVariant {
        match self {
            DeviceKind::LedLight(_) => DeviceVariant::LedLight,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Advertised {
    name: Option<String>,
    rssi: Option<i16>,
    manufacturer_data: BTreeMap<u16, Vec<u8>>,
}

/// One physical Govee peripheral
#[derive(Debug)]
pub struct Device {
    address: String,
    model: String,
    advertised: RwLock<Advertised>,
    kind: DeviceKind,
}

impl Device {
    /// Build a device of `variant` from the advertisement that classified it
    pub fn new(
        variant: DeviceVariant,
        model: &str,
        advertisement: &Advertisement,
        transport: Arc<dyn CommandTransport>,
        gate: &CommandGate,
    ) -> Self {
        let link = CommandLink {
            address: advertisement.address.clone(),
            transport,
            lock: gate.lock_for(&advertisement.address),
        };
        let kind = match variant {
            DeviceVariant::LedLight => DeviceKind::LedLight(LedLight::new(link)),
        };

        let device = Self {
            address: advertisement.address.clone(),
            model: model.to_string(),
            advertised: RwLock::new(Advertised::default()),
            kind,
        };
        device.update(advertisement);
        debug!("Created {} rssi={:?}", device, advertisement.rssi);
        device
    }

    /// Classify `advertisement` and build a device if a handler exists
    pub fn from_advertisement(
        advertisement: &Advertisement,
        transport: Arc<dyn CommandTransport>,
        gate: &CommandGate,
    ) -> Option<Self> {
        match classify(advertisement.name.as_deref()) {
            Classification::Supported { model, variant } => {
                Some(Self::new(variant, model, advertisement, transport, gate))
            }
            _ => None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn name(&self) -> Option<String> {
        read(&self.advertised).name.clone()
    }

    pub fn rssi(&self) -> Option<i16> {
        read(&self.advertised).rssi
    }

    pub fn manufacturer_data(&self) -> BTreeMap<u16, Vec<u8>> {
        read(&self.advertised).manufacturer_data.clone()
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    pub fn as_led_light(&self) -> Option<&LedLight> {
        match &self.kind {
            DeviceKind::LedLight(light) => Some(light),
        }
    }

    /// Refresh advertised fields from a new advertisement for this address.
    ///
    /// Light state is left untouched.
    pub fn update(&self, advertisement: &Advertisement) {
        let mut advertised = write(&self.advertised);
        if advertisement.name.is_some() {
            advertised.name = advertisement.name.clone();
        }
        advertised.rssi = advertisement.rssi;
        if !advertisement.manufacturer_data.is_empty() {
            advertised.manufacturer_data = advertisement.manufacturer_data.clone();
        }
    }

    /// Serializable point-in-time view
    pub fn snapshot(&self) -> DeviceSnapshot {
        let advertised = read(&self.advertised).clone();
        DeviceSnapshot {
            address: self.address.clone(),
            model: self.model.clone(),
            variant: self.kind.variant(),
            name: advertised.name,
            rssi: advertised.rssi,
            light: self.as_led_light().map(LedLight::state),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name().unwrap_or_else(|| "<unnamed>".to_string());
        write!(f, "{} ({}, {})", name, self.address, self.model)
    }
}

/// Serializable view of a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub address: String,
    pub model: String,
    pub variant: DeviceVariant,
    pub name: Option<String>,
    pub rssi: Option<i16>,
    pub light: Option<LightState>,
}
