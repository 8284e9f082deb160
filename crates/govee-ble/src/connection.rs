//! Scoped GATT connections for command delivery
//!
//! Each frame is written on a fresh connection: connect, discover services,
//! write, disconnect. The disconnect happens whether or not the write worked.

use btleplug::api::{Central, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use govee_core::Frame;
use tokio::time::timeout;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::BleTransportConfig;
use crate::error::BleTransportError;
use crate::protocol::peripheral_address;

// ----------------------------------------------------------------------------
// Connection Management
// ----------------------------------------------------------------------------

/// Writes command frames to peripherals known to the adapter
pub struct BleConnection {
    config: BleTransportConfig,
    adapter: Adapter,
}

impl BleConnection {
    pub fn new(config: BleTransportConfig, adapter: Adapter) -> Self {
        Self { config, adapter }
    }

    fn write_type(&self) -> WriteType {
        if self.config.write_with_response {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        }
    }

    /// Find a peripheral the adapter has seen by its normalized address
    async fn find_peripheral(&self, address: &str) -> Result<Peripheral, BleTransportError> {
        let peripherals = self.adapter.peripherals().await.map_err(|e| {
            BleTransportError::ConnectionFailed {
                address: address.to_string(),
                reason: format!("failed to list peripherals: {}", e),
            }
        })?;

        for peripheral in peripherals {
            if let Ok(Some(properties)) = peripheral.properties().await {
                if peripheral_address(&peripheral.id(), &properties).eq_ignore_ascii_case(address) {
                    return Ok(peripheral);
                }
            }
        }

        Err(BleTransportError::PeripheralNotFound {
            address: address.to_string(),
        })
    }

    /// Connect, write `frame` to `characteristic` and disconnect
    pub async fn write_frame(
        &self,
        address: &str,
        characteristic: Uuid,
        frame: &Frame,
    ) -> Result<(), BleTransportError> {
        let peripheral = self.find_peripheral(address).await?;

        let result = match timeout(self.config.connection_timeout, peripheral.connect()).await {
            Ok(Ok(())) => {
                debug!("Connected to {}", address);
                self.write_connected(&peripheral, address, characteristic, frame)
                    .await
            }
            Ok(Err(e)) => Err(BleTransportError::ConnectionFailed {
                address: address.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(BleTransportError::ConnectionTimeout {
                address: address.to_string(),
                timeout_ms: self.config.connection_timeout.as_millis() as u64,
            }),
        };

        if let Err(e) = peripheral.disconnect().await {
            warn!("Failed to disconnect from {}: {}", address, e);
        } else {
            debug!("Disconnected from {}", address);
        }

        if let Err(e) = &result {
            error!("Command to {} failed: {}", address, e);
        }
        result
    }

    async fn write_connected(
        &self,
        peripheral: &Peripheral,
        address: &str,
        characteristic: Uuid,
        frame: &Frame,
    ) -> Result<(), BleTransportError> {
        peripheral
            .discover_services()
            .await
            .map_err(|e| BleTransportError::ServiceDiscoveryFailed {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        let characteristics = peripheral.characteristics();
        let target = characteristics
            .iter()
            .find(|c| c.uuid == characteristic)
            .ok_or_else(|| BleTransportError::CharacteristicNotFound {
                address: address.to_string(),
                characteristic: characteristic.to_string(),
            })?;

        peripheral
            .write(target, frame.as_bytes(), self.write_type())
            .await
            .map_err(|e| BleTransportError::WriteFailed {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Wrote {} to {}", hex::encode(frame.as_bytes()), address);
        Ok(())
    }
}
