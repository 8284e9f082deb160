//! BLE transport configuration

use std::time::Duration;

use uuid::Uuid;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for BLE transport
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BleTransportConfig {
    /// Index into the host's adapter list
    pub adapter_index: usize,
    /// Maximum time to wait for a GATT connection
    pub connection_timeout: Duration,
    /// Request a write response from the light
    pub write_with_response: bool,
    /// Service filter handed to the adapter scan; empty scans everything
    pub scan_services: Vec<Uuid>,
}

impl Default for BleTransportConfig {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            connection_timeout: Duration::from_secs(5),
            write_with_response: false,
            // Govee lights do not advertise a service, so no filter
            scan_services: Vec::new(),
        }
    }
}

impl BleTransportConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the adapter to use
    pub fn with_adapter_index(mut self, index: usize) -> Self {
        self.adapter_index = index;
        self
    }

    /// Set connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Enable or disable acknowledged writes
    pub fn with_write_response(mut self, enabled: bool) -> Self {
        self.write_with_response = enabled;
        self
    }

    /// Restrict scanning to peripherals advertising these services
    pub fn with_scan_services(mut self, services: Vec<Uuid>) -> Self {
        self.scan_services = services;
        self
    }
}
