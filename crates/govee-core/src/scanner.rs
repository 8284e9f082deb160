//! Advertisement-driven discovery and dispatch
//!
//! A [`Scanner`] owns one continuous scan session. The transport pushes
//! advertisements into a channel; a single task drains it and dispatches each
//! advertisement in order:
//!
//! 1. a known address refreshes its [`Device`] and is published on the topic
//!    equal to the address;
//! 2. an unknown address with a supported model is registered and published on
//!    [`DEVICE_DISCOVERED`];
//! 3. a Govee name without a handler is logged and dropped;
//! 4. anything else is ignored.
//!
//! Because the discovery event is published before the next advertisement is
//! taken off the channel, updates for a device never precede its discovery.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::advertisement::Advertisement;
use crate::classifier::{is_vendor_name, model_from_name};
use crate::config::ScannerConfig;
use crate::device::{classify, Classification, CommandGate, Device, DeviceVariant};
use crate::errors::{GoveeError, Result, TransportError};
use crate::events::{DeviceEvent, EventBus, Subscription, DEVICE_DISCOVERED};
use crate::registry::Registry;
use crate::sync::{read, write};
use crate::transport::{AdvertisementSink, AdvertisementSource, CommandTransport, SessionId};

// ----------------------------------------------------------------------------
// Dispatcher
// ----------------------------------------------------------------------------

/// Registry, event bus and command plumbing shared with the dispatch task
struct Dispatcher {
    transport: Arc<dyn CommandTransport>,
    gate: CommandGate,
    registry: RwLock<Registry>,
    events: EventBus<DeviceEvent>,
}

impl Dispatcher {
    fn dispatch(&self, advertisement: Advertisement) {
        log_advertisement(&advertisement);

        let known = read(&self.registry).get(&advertisement.address);
        if let Some(device) = known {
            device.update(&advertisement);
            self.events
                .publish(&advertisement.address, &DeviceEvent { device });
            return;
        }

        match classify(advertisement.name.as_deref()) {
            Classification::Supported { model, variant } => {
                let device = Device::new(
                    variant,
                    model,
                    &advertisement,
                    Arc::clone(&self.transport),
                    &self.gate,
                );
                let (device, inserted) = write(&self.registry).insert(device);
                if inserted {
                    info!("Discovered {}", device);
                    self.events
                        .publish(DEVICE_DISCOVERED, &DeviceEvent { device });
                }
            }
            Classification::Unsupported { model } => {
                let name = advertisement.name.as_deref().unwrap_or_default();
                if advertisement.manufacturer_data.is_empty() {
                    debug!("{} reports unsupported Govee model {}", name, model);
                } else {
                    warn!(
                        "{} appears to be a Govee {}, but no handler has been created",
                        name, model
                    );
                }
            }
            Classification::NotGovee => {
                if is_vendor_name(advertisement.name.as_deref()) {
                    trace!(
                        "Ignoring malformed Govee name {:?} from {}",
                        advertisement.name,
                        advertisement.address
                    );
                }
            }
        }
    }
}

fn log_advertisement(advertisement: &Advertisement) {
    trace!("Advertisement from {}", advertisement.address);
    if model_from_name(advertisement.name.as_deref()).is_some()
        && !advertisement.manufacturer_data.is_empty()
    {
        debug!(
            "Advertisement message from {} (name={:?}): {:?}",
            advertisement.address,
            advertisement.name,
            advertisement.manufacturer_data_hex()
        );
    }
}

async fn run_dispatch_loop(
    dispatcher: Arc<Dispatcher>,
    mut advertisements: mpsc::UnboundedReceiver<Advertisement>,
    mut shutdown: oneshot::Receiver<()>,
    backlog_warn_threshold: usize,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            next = advertisements.recv() => match next {
                Some(advertisement) => {
                    let backlog = advertisements.len();
                    if backlog > backlog_warn_threshold {
                        warn!("Advertisement dispatch is {} messages behind", backlog);
                    }
                    dispatcher.dispatch(advertisement);
                }
                None => {
                    debug!("Advertisement channel closed");
                    break;
                }
            }
        }
    }
    debug!("Dispatch loop ended");
}

// ----------------------------------------------------------------------------
// Scanner
// ----------------------------------------------------------------------------

/// An open scan session that is closed however its owner goes away.
///
/// [`SessionGuard::close`] stops the session and reports the result. If the
/// guard is dropped instead (scanner dropped, lookup future cancelled) the stop
/// is spawned onto the current runtime.
struct SessionGuard {
    source: Arc<dyn AdvertisementSource>,
    session: SessionId,
    open: bool,
}

impl SessionGuard {
    async fn open(source: &Arc<dyn AdvertisementSource>, sink: AdvertisementSink) -> Result<Self> {
        let session = source.start_session(sink).await?;
        Ok(Self {
            source: Arc::clone(source),
            session,
            open: true,
        })
    }

    async fn close(mut self) -> std::result::Result<(), TransportError> {
        let stopped = self.source.stop_session(self.session).await;
        self.open = false;
        stopped
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        let session = self.session;
        let source = Arc::clone(&self.source);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!("Releasing abandoned scan session {}", session);
                runtime.spawn(async move {
                    if let Err(e) = source.stop_session(session).await {
                        warn!("Failed to release scan session {}: {}", session, e);
                    }
                });
            }
            Err(_) => warn!("Scan session {} leaked: no runtime to stop it on", session),
        }
    }
}

struct ScanHandle {
    session: SessionGuard,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Continuous Govee discovery over an [`AdvertisementSource`]
///
/// `start` and `stop` must alternate: starting a running scanner fails with
/// [`GoveeError::AlreadyScanning`], stopping an idle one with
/// [`GoveeError::NotScanning`]. Dropping a running scanner aborts its dispatch
/// task and stops its scan session in the background.
pub struct Scanner {
    config: ScannerConfig,
    source: Arc<dyn AdvertisementSource>,
    dispatcher: Arc<Dispatcher>,
    scan: Mutex<Option<ScanHandle>>,
}

impl Scanner {
    /// Scanner over a radio that both scans and delivers commands
    pub fn new<R>(radio: Arc<R>) -> Self
    where
        R: AdvertisementSource + CommandTransport + 'static,
    {
        Self::with_config(radio, ScannerConfig::default())
    }

    pub fn with_config<R>(radio: Arc<R>, config: ScannerConfig) -> Self
    where
        R: AdvertisementSource + CommandTransport + 'static,
    {
        let source: Arc<dyn AdvertisementSource> = radio.clone();
        let transport: Arc<dyn CommandTransport> = radio;
        Self::from_parts(source, transport, config)
    }

    /// Scanner with separate scanning and command transports
    pub fn from_parts(
        source: Arc<dyn AdvertisementSource>,
        transport: Arc<dyn CommandTransport>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            config,
            source,
            dispatcher: Arc::new(Dispatcher {
                transport,
                gate: CommandGate::new(),
                registry: RwLock::new(Registry::new()),
                events: EventBus::new(),
            }),
            scan: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Open the continuous scan session and spawn the dispatch task
    pub async fn start(&self) -> Result<()> {
        let mut scan = self.scan.lock().await;
        if scan.is_some() {
            return Err(GoveeError::AlreadyScanning);
        }

        let (sink, advertisements) = mpsc::unbounded_channel();
        let session = SessionGuard::open(&self.source, sink).await?;
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_dispatch_loop(
            Arc::clone(&self.dispatcher),
            advertisements,
            shutdown_rx,
            self.config.backlog_warn_threshold,
        ));

        info!("Scanning for Govee devices (session {})", session.session);
        *scan = Some(ScanHandle {
            session,
            shutdown,
            task,
        });
        Ok(())
    }

    /// Close the continuous scan session and wait for the dispatch task
    pub async fn stop(&self) -> Result<()> {
        let handle = self
            .scan
            .lock()
            .await
            .take()
            .ok_or(GoveeError::NotScanning)?;

        let ScanHandle {
            session,
            shutdown,
            task,
        } = handle;
        let id = session.session;
        let stopped = session.close().await;
        // The task may already have exited on a closed channel
        let _ = shutdown.send(());
        if let Err(e) = task.await {
            warn!("Dispatch task for session {} failed: {}", id, e);
        }
        stopped?;

        info!(
            "Stopped scanning, {} device(s) known",
            read(&self.dispatcher.registry).len()
        );
        Ok(())
    }

    pub async fn is_scanning(&self) -> bool {
        self.scan.lock().await.is_some()
    }

    /// Subscribe to a topic; returns the unsubscribe handle
    pub fn on<F>(&self, topic: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(&DeviceEvent) + Send + Sync + 'static,
    {
        self.dispatcher.events.subscribe(topic, listener)
    }

    /// Subscribe to [`DEVICE_DISCOVERED`]
    pub fn on_discovered<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DeviceEvent) + Send + Sync + 'static,
    {
        self.on(DEVICE_DISCOVERED, listener)
    }

    /// Subscribe to updates of a single device
    pub fn on_device<F>(&self, address: &str, listener: F) -> Subscription
    where
        F: Fn(&DeviceEvent) + Send + Sync + 'static,
    {
        self.on(address, listener)
    }

    /// Publish `event` on `topic`, returning the number of listeners reached
    pub fn emit(&self, topic: &str, event: &DeviceEvent) -> usize {
        self.dispatcher.events.publish(topic, event)
    }

    /// Registered devices in discovery order
    pub fn known_devices(&self) -> Vec<Arc<Device>> {
        read(&self.dispatcher.registry).devices()
    }

    /// Registered device by address, compared case-insensitively
    pub fn device(&self, address: &str) -> Option<Arc<Device>> {
        read(&self.dispatcher.registry).find(address)
    }

    /// Run the dispatch step for one advertisement on the caller's thread.
    ///
    /// The dispatch task uses the same path; calling this while scanning
    /// interleaves with the transport's feed.
    pub fn handle_advertisement(&self, advertisement: Advertisement) {
        self.dispatcher.dispatch(advertisement);
    }

    /// One-shot lookup using the configured timeout
    pub async fn find_device(&self, identifier: &str) -> Result<Option<Arc<Device>>> {
        self.find_by_address(identifier, self.config.find_timeout)
            .await
    }

    /// Scan on a separate session until `identifier` advertises a supported
    /// model or `timeout` elapses.
    ///
    /// The registry is not modified. If the address is already registered the
    /// registered instance is returned. A session closed by the transport
    /// before the timeout is reported as [`TransportError::ScanFailed`]. The
    /// lookup session is released even if this future is dropped early.
    pub async fn find_by_address(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> Result<Option<Arc<Device>>> {
        let (sink, mut advertisements) = mpsc::unbounded_channel();
        let session = SessionGuard::open(&self.source, sink).await?;
        let id = session.session;
        debug!(
            "Looking for {} (session {}, timeout {:?})",
            identifier, id, timeout
        );

        let search = async {
            while let Some(advertisement) = advertisements.recv().await {
                if !advertisement.matches_address(identifier) {
                    continue;
                }
                let supported = match classify(advertisement.name.as_deref()) {
                    Classification::Supported { model, variant } => {
                        Some((model.to_string(), variant))
                    }
                    _ => None,
                };
                if let Some((model, variant)) = supported {
                    return Lookup::Found(advertisement, model, variant);
                }
            }
            Lookup::Closed
        };
        let outcome = tokio::time::timeout(timeout, search).await;

        if let Err(e) = session.close().await {
            warn!("Failed to stop lookup session {}: {}", id, e);
        }

        let (advertisement, model, variant) = match outcome {
            Ok(Lookup::Found(advertisement, model, variant)) => (advertisement, model, variant),
            Ok(Lookup::Closed) => {
                return Err(TransportError::ScanFailed {
                    reason: format!(
                        "lookup session {} closed before {} was found",
                        id, identifier
                    ),
                }
                .into());
            }
            Err(_) => {
                debug!("{} not found within {:?}", identifier, timeout);
                return Ok(None);
            }
        };

        if let Some(device) = self.device(&advertisement.address) {
            return Ok(Some(device));
        }
        Ok(Some(Arc::new(Device::new(
            variant,
            &model,
            &advertisement,
            Arc::clone(&self.dispatcher.transport),
            &self.dispatcher.gate,
        ))))
    }
}

/// Outcome of the search half of a lookup
enum Lookup {
    Found(Advertisement, String, DeviceVariant),
    Closed,
}

impl Drop for Scanner {
    fn drop(&mut self) {
        // Dropping the handle releases its session through the guard
        if let Some(handle) = self.scan.get_mut().take() {
            warn!(
                "Scanner dropped while session {} was running; aborting dispatch",
                handle.session.session
            );
            handle.task.abort();
        }
    }
}
