//! The client facade: configuration, lifecycle, and the handles the rest
//! of the application uses.

use crate::api::ServerApi;
use crate::connectivity::{run_pump, ConnectionMonitor, PumpContext};
use crate::error::EngineError;
use crate::reconcile::Reconciler;
use crate::resync::resync;
use crate::transport::{SocketConnector, TransportAdapter, TransportConfig};
use lectern_store::LocalStore;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Configuration for a sync client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the coordinating server.
    pub base_url: String,
    /// The active user on this device; drives the notification
    /// subscription and authorship of mutations.
    pub user_id: String,
    pub user_name: String,
    /// Timeout for the pre-flight liveness probe.
    pub probe_timeout: Duration,
    /// Timeout for the full-snapshot fetch.
    pub resync_timeout: Duration,
    /// Maximum automatic reconnect attempts after a drop.
    pub reconnect_attempts: u32,
    /// Fixed delay between reconnect attempts.
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            user_id: "anonymous".to_string(),
            user_name: "Anonymous".to_string(),
            probe_timeout: Duration::from_secs(2),
            resync_timeout: Duration::from_secs(10),
            reconnect_attempts: 3,
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

/// Builder for client configuration.
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn user(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.config.user_id = id.into();
        self.config.user_name = name.into();
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    pub fn resync_timeout(mut self, timeout: Duration) -> Self {
        self.config.resync_timeout = timeout;
        self
    }

    pub fn reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.reconnect_attempts = attempts;
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle events a client emits for observers (typically the rendering
/// layer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientEvent {
    Connected,
    Disconnected,
    /// A full resync replaced the local collections.
    Resynced,
    /// A resync attempt failed; local state is untouched.
    ResyncFailed,
    /// An inbound server event was reconciled into the store.
    EventApplied { event: &'static str },
}

/// The sync engine facade.
///
/// Owns the transport adapter and the reconciliation pump, and exposes the
/// optimistic mutation surface (see the `mutations` module). Constructed
/// once, then passed by reference to every consumer.
pub struct SyncClient {
    pub(crate) config: ClientConfig,
    pub(crate) store: Arc<LocalStore>,
    pub(crate) adapter: Arc<TransportAdapter>,
    api: Arc<dyn ServerApi>,
    monitor: Arc<ConnectionMonitor>,
    events_tx: broadcast::Sender<ClientEvent>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl SyncClient {
    /// Wire a client together from its collaborators. The store is shared:
    /// the caller keeps its own handle for reads.
    pub fn new(
        config: ClientConfig,
        store: Arc<LocalStore>,
        connector: Arc<dyn SocketConnector>,
        api: Arc<dyn ServerApi>,
    ) -> Self {
        let transport_config = TransportConfig {
            reconnect_attempts: config.reconnect_attempts,
            reconnect_delay: config.reconnect_delay,
        };
        let adapter = Arc::new(TransportAdapter::new(
            connector,
            api.clone(),
            transport_config,
        ));
        let (events_tx, _) = broadcast::channel(256);

        SyncClient {
            config,
            store,
            adapter,
            api,
            monitor: Arc::new(ConnectionMonitor::new()),
            events_tx,
            pump: Mutex::new(None),
        }
    }

    /// Start the reconciliation pump. Must be called once, from within a
    /// tokio runtime, before `connect`.
    pub fn init(&self) {
        let mut pump = self.pump.lock();
        if pump.is_some() {
            return;
        }

        let events = self.adapter.events();
        let ctx = PumpContext {
            monitor: self.monitor.clone(),
            store: self.store.clone(),
            adapter: self.adapter.clone(),
            api: self.api.clone(),
            reconciler: Reconciler::new(self.store.clone()),
            events_tx: self.events_tx.clone(),
            user_id: self.config.user_id.clone(),
        };
        *pump = Some(tokio::spawn(run_pump(events, ctx)));
    }

    /// Probe the server and connect. Safe to call repeatedly.
    pub async fn connect(&self) {
        self.adapter.connect().await;
    }

    /// The connected flag; `false` means every mutation stays local-only.
    pub fn connected(&self) -> bool {
        self.monitor.is_connected()
    }

    /// Current transport lifecycle state.
    pub fn transport_state(&self) -> crate::transport::TransportState {
        self.adapter.state()
    }

    /// Watch the connected flag.
    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.monitor.watch()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events_tx.subscribe()
    }

    /// Shared handle to the local store.
    pub fn store(&self) -> Arc<LocalStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Caller-initiated full resync.
    pub async fn refresh(&self) -> Result<(), EngineError> {
        resync(self.api.as_ref(), &self.store).await?;
        let _ = self.events_tx.send(ClientEvent::Resynced);
        Ok(())
    }

    /// Tear down the transport and stop the pump.
    pub async fn dispose(&self) {
        self.adapter.close().await;
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
    }
}
