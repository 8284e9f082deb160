//! Error types for Govee device control
//!
//! Transport failures are kept in their own enum so radio implementations can
//! report them without knowing about the rest of the core error surface.

use thiserror::Error;

// ----------------------------------------------------------------------------
// Transport Errors
// ----------------------------------------------------------------------------

/// Failures reported by a radio/GATT transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("BLE adapter not available: {reason}")]
    AdapterUnavailable { reason: String },

    #[error("Peripheral not found: {address}")]
    PeripheralNotFound { address: String },

    #[error("Connection failed to {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Characteristic {characteristic} not found on {address}")]
    CharacteristicNotFound {
        address: String,
        characteristic: String,
    },

    #[error("Write to {address} rejected: {reason}")]
    WriteFailed { address: String, reason: String },

    #[error("Transport timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Scan failed: {reason}")]
    ScanFailed { reason: String },

    #[error("Unknown scan session {session}")]
    UnknownSession { session: u64 },
}

// ----------------------------------------------------------------------------
// Core Error
// ----------------------------------------------------------------------------

/// Core error type for discovery and device control
#[derive(Debug, Error)]
pub enum GoveeError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Brightness {value} out of range (0..=100)")]
    InvalidBrightness { value: u32 },

    #[error("Color channel {channel} value {value} out of range (0..=255)")]
    InvalidColorChannel { channel: &'static str, value: i64 },

    #[error("Frame payload too long: {len} bytes (max: {max})")]
    PayloadTooLong { len: usize, max: usize },

    #[error("Invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("Scanner is already running")]
    AlreadyScanning,

    #[error("Scanner is not running")]
    NotScanning,
}

/// Result type for core operations
pub type Result<T> = core::result::Result<T, GoveeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_converts_into_core_error() {
        let err: GoveeError = TransportError::Timeout { duration_ms: 500 }.into();
        assert!(matches!(
            err,
            GoveeError::Transport(TransportError::Timeout { duration_ms: 500 })
        ));
        assert_eq!(err.to_string(), "Transport error: Transport timeout after 500ms");
    }
}
