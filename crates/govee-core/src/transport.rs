//! Transport abstraction for Govee device control
//!
//! The core never talks to a radio directly. Scanning is provided by an
//! [`AdvertisementSource`] that pushes advertisements into a channel, and
//! command delivery by a [`CommandTransport`] that performs one scoped
//! connect/write/disconnect per frame.

use core::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::advertisement::Advertisement;
use crate::errors::TransportError;
use crate::frame::Frame;

/// Sending half handed to a scan session
pub type AdvertisementSink = mpsc::UnboundedSender<Advertisement>;

/// Identifies one open scan session on an [`AdvertisementSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Transport Traits
// ----------------------------------------------------------------------------

/// Source of BLE advertisements
///
/// Sessions are independent: a short-lived lookup can run while a continuous
/// scan is open. Advertisements for a session are delivered in the order the
/// radio reported them.
#[async_trait]
pub trait AdvertisementSource: Send + Sync {
    /// Begin a scan session delivering every advertisement into `sink`
    async fn start_session(&self, sink: AdvertisementSink) -> Result<SessionId, TransportError>;

    /// End a scan session; the session's sink is dropped once this returns
    async fn stop_session(&self, session: SessionId) -> Result<(), TransportError>;
}

/// Delivery of command frames to a peripheral
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Write one frame to `characteristic` on the peripheral at `address`.
    ///
    /// Implementations hold the connection only for the duration of the call
    /// and release it on both success and failure. No retries.
    async fn write_command(
        &self,
        address: &str,
        characteristic: Uuid,
        frame: &Frame,
    ) -> Result<(), TransportError>;
}
