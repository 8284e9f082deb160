//! Error types for BLE transport

use govee_core::TransportError;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors specific to the BLE transport
#[derive(Error, Debug)]
pub enum BleTransportError {
    #[error("Failed to create BLE manager: {0}")]
    ManagerUnavailable(String),

    #[error("BLE adapter {index} not available ({available} found)")]
    AdapterNotAvailable { index: usize, available: usize },

    #[error("Peripheral not found: {address}")]
    PeripheralNotFound { address: String },

    #[error("Failed to connect to {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Connection to {address} timed out after {timeout_ms}ms")]
    ConnectionTimeout { address: String, timeout_ms: u64 },

    #[error("Failed to discover services on {address}: {reason}")]
    ServiceDiscoveryFailed { address: String, reason: String },

    #[error("Characteristic {characteristic} not found on {address}")]
    CharacteristicNotFound {
        address: String,
        characteristic: String,
    },

    #[error("Failed to write to {address}: {reason}")]
    WriteFailed { address: String, reason: String },

    #[error("Failed to get BLE events: {0}")]
    EventStreamFailed(String),

    #[error("Failed to start BLE scan: {0}")]
    ScanFailed(String),

    #[error("Unknown scan session {0}")]
    UnknownSession(u64),
}

impl From<BleTransportError> for TransportError {
    fn from(err: BleTransportError) -> Self {
        match err {
            BleTransportError::ManagerUnavailable(reason) => {
                TransportError::AdapterUnavailable { reason }
            }
            BleTransportError::AdapterNotAvailable { .. } => TransportError::AdapterUnavailable {
                reason: err.to_string(),
            },
            BleTransportError::PeripheralNotFound { address } => {
                TransportError::PeripheralNotFound { address }
            }
            BleTransportError::ConnectionFailed { address, reason }
            | BleTransportError::ServiceDiscoveryFailed { address, reason } => {
                TransportError::ConnectionFailed { address, reason }
            }
            BleTransportError::ConnectionTimeout { timeout_ms, .. } => TransportError::Timeout {
                duration_ms: timeout_ms,
            },
            BleTransportError::CharacteristicNotFound {
                address,
                characteristic,
            } => TransportError::CharacteristicNotFound {
                address,
                characteristic,
            },
            BleTransportError::WriteFailed { address, reason } => {
                TransportError::WriteFailed { address, reason }
            }
            BleTransportError::EventStreamFailed(reason) | BleTransportError::ScanFailed(reason) => {
                TransportError::ScanFailed { reason }
            }
            BleTransportError::UnknownSession(session) => TransportError::UnknownSession { session },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_keeps_address() {
        let err: TransportError = BleTransportError::WriteFailed {
            address: "A4:C1:38:00:00:01".to_string(),
            reason: "gatt error".to_string(),
        }
        .into();
        assert_eq!(
            err,
            TransportError::WriteFailed {
                address: "A4:C1:38:00:00:01".to_string(),
                reason: "gatt error".to_string(),
            }
        );
    }

    #[test]
    fn test_timeout_maps_to_transport_timeout() {
        let err: TransportError = BleTransportError::ConnectionTimeout {
            address: "A4:C1:38:00:00:01".to_string(),
            timeout_ms: 5000,
        }
        .into();
        assert_eq!(err, TransportError::Timeout { duration_ms: 5000 });
    }
}
