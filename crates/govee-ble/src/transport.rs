//! BLE transport implementing the core radio traits

use async_trait::async_trait;
use govee_core::{
    AdvertisementSink, AdvertisementSource, CommandTransport, Frame, SessionId, TransportError,
};
use uuid::Uuid;

use crate::config::BleTransportConfig;
use crate::connection::BleConnection;
use crate::discovery::{initialize_adapter, BleDiscovery};
use crate::error::BleTransportError;

// ----------------------------------------------------------------------------
// BLE Transport
// ----------------------------------------------------------------------------

/// btleplug-backed radio for a [`govee_core::Scanner`]
pub struct BleTransport {
    config: BleTransportConfig,
    discovery: BleDiscovery,
    connection: BleConnection,
}

impl BleTransport {
    /// Open the default adapter with default settings
    pub async fn new() -> Result<Self, BleTransportError> {
        Self::with_config(BleTransportConfig::default()).await
    }

    /// Open the adapter selected by `config`
    pub async fn with_config(config: BleTransportConfig) -> Result<Self, BleTransportError> {
        let adapter = initialize_adapter(&config).await?;
        Ok(Self {
            discovery: BleDiscovery::new(config.clone(), adapter.clone()),
            connection: BleConnection::new(config.clone(), adapter),
            config,
        })
    }

    pub fn config(&self) -> &BleTransportConfig {
        &self.config
    }
}

#[async_trait]
impl AdvertisementSource for BleTransport {
    async fn start_session(&self, sink: AdvertisementSink) -> Result<SessionId, TransportError> {
        Ok(self.discovery.start_session(sink).await?)
    }

    async fn stop_session(&self, session: SessionId) -> Result<(), TransportError> {
        Ok(self.discovery.stop_session(session).await?)
    }
}

#[async_trait]
impl CommandTransport for BleTransport {
    async fn write_command(
        &self,
        address: &str,
        characteristic: Uuid,
        frame: &Frame,
    ) -> Result<(), TransportError> {
        Ok(self
            .connection
            .write_frame(address, characteristic, frame)
            .await?)
    }
}
