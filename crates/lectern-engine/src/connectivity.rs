//! The connectivity monitor: the single source of truth for the
//! connected/disconnected flag, and the pump that reacts to transport
//! transitions.
//!
//! On every transition into `Connected` the pump triggers a full resync and
//! re-establishes the per-user notification subscription. On a transition
//! into `Disconnected` it only flips the flag: the local store is left
//! untouched and keeps serving reads and writes.

use crate::api::ServerApi;
use crate::client::ClientEvent;
use crate::reconcile::Reconciler;
use crate::resync::resync;
use crate::transport::{AdapterEvent, TransportAdapter};
use lectern_model::ClientOp;
use lectern_store::LocalStore;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{info, warn};

/// Owns the connected flag the rest of the application observes.
pub struct ConnectionMonitor {
    connected_tx: watch::Sender<bool>,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        let (connected_tx, _) = watch::channel(false);
        ConnectionMonitor { connected_tx }
    }

    pub fn is_connected(&self) -> bool {
        *self.connected_tx.borrow()
    }

    /// Subscribe to flag changes.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.connected_tx.subscribe()
    }

    pub(crate) fn set(&self, connected: bool) {
        self.connected_tx.send_replace(connected);
    }
}

/// Everything the pump needs to react to adapter events.
pub(crate) struct PumpContext {
    pub monitor: Arc<ConnectionMonitor>,
    pub store: Arc<LocalStore>,
    pub adapter: Arc<TransportAdapter>,
    pub api: Arc<dyn ServerApi>,
    pub reconciler: Reconciler,
    pub events_tx: broadcast::Sender<ClientEvent>,
    pub user_id: String,
}

/// Single consumer of the adapter event stream; being the only consumer is
/// what guarantees inbound events are reconciled in delivery order.
pub(crate) async fn run_pump(mut events: mpsc::UnboundedReceiver<AdapterEvent>, ctx: PumpContext) {
    while let Some(event) = events.recv().await {
        match event {
            AdapterEvent::Up => {
                info!("connected to coordinating server");
                ctx.monitor.set(true);
                let _ = ctx.events_tx.send(ClientEvent::Connected);

                match resync(ctx.api.as_ref(), &ctx.store).await {
                    Ok(()) => {
                        let _ = ctx.events_tx.send(ClientEvent::Resynced);
                    }
                    Err(err) => {
                        warn!(error = %err, "resync failed, keeping local state");
                        let _ = ctx.events_tx.send(ClientEvent::ResyncFailed);
                    }
                }

                ctx.adapter
                    .send(ClientOp::SubscribeNotifications(ctx.user_id.clone()));
            }
            AdapterEvent::Down => {
                info!("disconnected, continuing with local state");
                ctx.monitor.set(false);
                let _ = ctx.events_tx.send(ClientEvent::Disconnected);
            }
            AdapterEvent::Message(event) => {
                let name = event.name();
                ctx.reconciler.apply(event);
                let _ = ctx.events_tx.send(ClientEvent::EventApplied { event: name });
            }
        }
    }
}
