//! BLE adapter setup and advertisement scanning
//!
//! Several scan sessions can be open at once (a continuous scan and a
//! one-shot lookup). The adapter scan runs while at least one session is
//! open; each session gets its own event stream and forwarding task.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::stream::{Stream, StreamExt};
use govee_core::{AdvertisementSink, SessionId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::BleTransportConfig;
use crate::error::BleTransportError;
use crate::protocol::advertisement_from_properties;

// ----------------------------------------------------------------------------
// Adapter Initialization
// ----------------------------------------------------------------------------

/// Open the adapter selected by `config.adapter_index`
pub async fn initialize_adapter(config: &BleTransportConfig) -> Result<Adapter, BleTransportError> {
    let manager = Manager::new()
        .await
        .map_err(|e| BleTransportError::ManagerUnavailable(e.to_string()))?;

    let adapters = manager
        .adapters()
        .await
        .map_err(|e| BleTransportError::ManagerUnavailable(e.to_string()))?;

    let available = adapters.len();
    let adapter = adapters
        .into_iter()
        .nth(config.adapter_index)
        .ok_or(BleTransportError::AdapterNotAvailable {
            index: config.adapter_index,
            available,
        })?;

    match adapter.adapter_info().await {
        Ok(info) => info!("BLE adapter initialized: {}", info),
        Err(_) => info!("BLE adapter {} initialized", config.adapter_index),
    }
    Ok(adapter)
}

// ----------------------------------------------------------------------------
// Discovery Implementation
// ----------------------------------------------------------------------------

/// Handles BLE scanning for any number of concurrent sessions
pub struct BleDiscovery {
    config: BleTransportConfig,
    adapter: Adapter,
    next_session: AtomicU64,
    sessions: Mutex<HashMap<SessionId, JoinHandle<()>>>,
}

impl BleDiscovery {
    pub fn new(config: BleTransportConfig, adapter: Adapter) -> Self {
        Self {
            config,
            adapter,
            next_session: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Open a session forwarding every advertisement into `sink`
    pub async fn start_session(
        &self,
        sink: AdvertisementSink,
    ) -> Result<SessionId, BleTransportError> {
        let mut sessions = self.sessions.lock().await;

        let events = self
            .adapter
            .events()
            .await
            .map_err(|e| BleTransportError::EventStreamFailed(e.to_string()))?;

        if sessions.is_empty() {
            let filter = ScanFilter {
                services: self.config.scan_services.clone(),
            };
            self.adapter
                .start_scan(filter)
                .await
                .map_err(|e| BleTransportError::ScanFailed(e.to_string()))?;
            info!("Started BLE scanning");
        }

        let session = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        let task = tokio::spawn(forward_advertisements(
            self.adapter.clone(),
            events,
            sink,
            session,
        ));
        sessions.insert(session, task);
        debug!("Opened scan session {} ({} open)", session, sessions.len());
        Ok(session)
    }

    /// Close a session; the adapter scan stops with the last one
    pub async fn stop_session(&self, session: SessionId) -> Result<(), BleTransportError> {
        let mut sessions = self.sessions.lock().await;
        let task = sessions
            .remove(&session)
            .ok_or(BleTransportError::UnknownSession(session.0))?;
        task.abort();
        debug!("Closed scan session {} ({} open)", session, sessions.len());

        if sessions.is_empty() {
            self.adapter
                .stop_scan()
                .await
                .map_err(|e| BleTransportError::ScanFailed(e.to_string()))?;
            info!("Stopped BLE scanning");
        }
        Ok(())
    }
}

impl Drop for BleDiscovery {
    fn drop(&mut self) {
        for (_, task) in self.sessions.get_mut().drain() {
            task.abort();
        }
    }
}

// ----------------------------------------------------------------------------
// Event Forwarding
// ----------------------------------------------------------------------------

fn advertised_peripheral(event: CentralEvent) -> Option<PeripheralId> {
    match event {
        CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => Some(id),
        CentralEvent::ManufacturerDataAdvertisement { id, .. } => Some(id),
        _ => None,
    }
}

async fn forward_advertisements<S>(
    adapter: Adapter,
    mut events: S,
    sink: AdvertisementSink,
    session: SessionId,
) where
    S: Stream<Item = CentralEvent> + Unpin + Send,
{
    while let Some(event) = events.next().await {
        let Some(id) = advertised_peripheral(event) else {
            continue;
        };

        let peripheral = match adapter.peripheral(&id).await {
            Ok(peripheral) => peripheral,
            Err(e) => {
                trace!("Peripheral {:?} vanished before lookup: {}", id, e);
                continue;
            }
        };

        let properties = match peripheral.properties().await {
            Ok(Some(properties)) => properties,
            Ok(None) => continue,
            Err(e) => {
                warn!("Failed to read properties of {:?}: {}", id, e);
                continue;
            }
        };

        if sink
            .send(advertisement_from_properties(&id, &properties))
            .is_err()
        {
            debug!("Scan session {} receiver dropped", session);
            break;
        }
    }
    debug!("Event stream for scan session {} ended", session);
}
