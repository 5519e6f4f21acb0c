//! The transport adapter: one long-lived pub/sub connection with a
//! pre-flight liveness probe and bounded reconnection.
//!
//! State machine:
//!
//! ```text
//! Uninitialized -> Probing -> { Connecting | Disconnected }
//! Connecting    -> Connected      (handshake acknowledged)
//! Connected     -> Disconnected   (transport-level drop)
//! Disconnected  -> Connecting     (bounded automatic retry)
//!               -> Failed         (attempts exhausted; local-only mode)
//! ```
//!
//! A failed probe settles in `Disconnected` without a socket attempt, so an
//! unreachable server degrades immediately to offline mode instead of
//! hanging or spamming reconnects.

use crate::api::ServerApi;
use crate::error::TransportError;
use async_trait::async_trait;
use lectern_model::{ClientOp, ServerEvent};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Connection lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Uninitialized,
    Probing,
    Connecting,
    Connected,
    Disconnected,
    Failed,
}

/// What a live connection yields.
#[derive(Debug)]
pub enum LinkEvent {
    /// An inbound broadcast or echo event.
    Message(ServerEvent),
    /// The connection dropped at the transport level.
    Dropped,
}

/// A live pub/sub connection.
#[async_trait]
pub trait SocketLink: Send + Sync {
    /// Emit an operation event to the server.
    async fn emit(&self, op: ClientOp) -> Result<(), TransportError>;

    /// Take the inbound event stream. Can only be taken once per link.
    fn incoming(&self) -> mpsc::UnboundedReceiver<LinkEvent>;

    /// Deterministic teardown.
    async fn close(&self);
}

/// Opens pub/sub connections to the coordinating endpoint.
#[async_trait]
pub trait SocketConnector: Send + Sync + 'static {
    async fn open(&self) -> Result<Box<dyn SocketLink>, TransportError>;
}

/// Events the adapter surfaces to its single consumer.
#[derive(Debug)]
pub enum AdapterEvent {
    /// The connection came up (first connect or reconnect).
    Up,
    /// The connection went down.
    Down,
    /// An inbound server event, in delivery order.
    Message(ServerEvent),
}

/// Reconnection policy.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Maximum automatic reconnect attempts after a drop.
    pub reconnect_attempts: u32,
    /// Fixed delay between attempts.
    pub reconnect_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            reconnect_attempts: 3,
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

/// Owns the single bidirectional pub/sub connection.
pub struct TransportAdapter {
    connector: Arc<dyn SocketConnector>,
    api: Arc<dyn ServerApi>,
    config: TransportConfig,
    state: RwLock<TransportState>,
    link: RwLock<Option<Arc<dyn SocketLink>>>,
    outbound_tx: mpsc::UnboundedSender<ClientOp>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<ClientOp>>>,
    events_tx: mpsc::UnboundedSender<AdapterEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<AdapterEvent>>>,
    closed: AtomicBool,
}

impl TransportAdapter {
    pub fn new(
        connector: Arc<dyn SocketConnector>,
        api: Arc<dyn ServerApi>,
        config: TransportConfig,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        TransportAdapter {
            connector,
            api,
            config,
            state: RwLock::new(TransportState::Uninitialized),
            link: RwLock::new(None),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            closed: AtomicBool::new(false),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransportState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == TransportState::Connected
    }

    /// Take the adapter event stream. Can only be taken once.
    pub fn events(&self) -> mpsc::UnboundedReceiver<AdapterEvent> {
        self.events_rx
            .lock()
            .take()
            .expect("events can only be taken once")
    }

    /// Probe the server and establish the connection. Idempotent: calling
    /// while probing, connecting or connected is a no-op.
    pub async fn connect(self: &Arc<Self>) {
        {
            let mut state = self.state.write();
            match *state {
                TransportState::Probing
                | TransportState::Connecting
                | TransportState::Connected => return,
                _ => *state = TransportState::Probing,
            }
        }
        self.spawn_writer();

        if !self.api.probe().await {
            info!("liveness probe failed, staying offline");
            self.set_state(TransportState::Disconnected);
            return;
        }

        self.set_state(TransportState::Connecting);
        match self.connector.open().await {
            Ok(link) => self.install_link(link),
            Err(err) => {
                warn!(error = %err, "initial connection failed");
                self.set_state(TransportState::Disconnected);
                let adapter = self.clone();
                tokio::spawn(async move { adapter.retry_loop().await });
            }
        }
    }

    /// Queue an operation event. Silently dropped unless connected: a
    /// mutation made offline stays local until the next full resync.
    pub fn send(&self, op: ClientOp) {
        if !self.is_connected() {
            debug!(op = op.name(), "transport not connected, dropping operation");
            return;
        }
        let _ = self.outbound_tx.send(op);
    }

    /// Tear the connection down and stop reconnecting.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let link = self.link.write().take();
        if let Some(link) = link {
            link.close().await;
        }
        self.set_state(TransportState::Disconnected);
    }

    fn set_state(&self, state: TransportState) {
        *self.state.write() = state;
    }

    /// Single writer task: preserves the order operations were queued in.
    fn spawn_writer(self: &Arc<Self>) {
        let rx = self.outbound_rx.lock().take();
        if let Some(mut rx) = rx {
            let adapter = self.clone();
            tokio::spawn(async move {
                while let Some(op) = rx.recv().await {
                    let link = adapter.link.read().clone();
                    if let Some(link) = link {
                        if let Err(err) = link.emit(op).await {
                            warn!(error = %err, "emit failed");
                        }
                    }
                }
            });
        }
    }

    fn install_link(self: &Arc<Self>, link: Box<dyn SocketLink>) {
        let link: Arc<dyn SocketLink> = Arc::from(link);
        let mut incoming = link.incoming();
        *self.link.write() = Some(link);
        self.set_state(TransportState::Connected);
        let _ = self.events_tx.send(AdapterEvent::Up);

        let adapter = self.clone();
        tokio::spawn(async move {
            while let Some(event) = incoming.recv().await {
                match event {
                    LinkEvent::Message(e) => {
                        let _ = adapter.events_tx.send(AdapterEvent::Message(e));
                    }
                    LinkEvent::Dropped => break,
                }
            }
            adapter.handle_drop().await;
        });
    }

    async fn handle_drop(self: &Arc<Self>) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        *self.link.write() = None;
        self.set_state(TransportState::Disconnected);
        let _ = self.events_tx.send(AdapterEvent::Down);
        info!("transport dropped");
        self.retry_loop().await;
    }

    async fn retry_loop(self: &Arc<Self>) {
        for attempt in 1..=self.config.reconnect_attempts {
            if self.closed.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(self.config.reconnect_delay).await;
            self.set_state(TransportState::Connecting);
            match self.connector.open().await {
                Ok(link) => {
                    info!(attempt, "transport reconnected");
                    self.install_link(link);
                    return;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "reconnect attempt failed");
                    self.set_state(TransportState::Disconnected);
                }
            }
        }
        warn!("reconnect attempts exhausted, continuing in local-only mode");
        self.set_state(TransportState::Failed);
    }
}
