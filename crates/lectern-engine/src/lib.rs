//! Lectern Engine - the client-side replication engine.
//!
//! Keeps the local entity collections consistent with a coordinating
//! server and other connected clients while remaining fully usable
//! offline: mutations apply to the local store immediately and are
//! forwarded when connected, inbound events are reconciled idempotently,
//! and every (re)connection triggers a full-state resync.
//!
//! # Quick start
//!
//! ```no_run
//! use lectern_engine::{ClientConfig, MemoryHub, SyncClient};
//! use lectern_store::{LocalStore, MemoryBackend};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let hub = MemoryHub::new();
//!     let store = Arc::new(LocalStore::open(Arc::new(MemoryBackend::new()), "lectern"));
//!     let config = ClientConfig {
//!         user_id: "S1".to_string(),
//!         user_name: "Alice".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let client = SyncClient::new(
//!         config,
//!         store.clone(),
//!         Arc::new(hub.connector()),
//!         Arc::new(hub.api()),
//!     );
//!     client.init();
//!     client.connect().await;
//!
//!     // Mutations apply locally right away, connected or not.
//!     let post = client.create_post("looking for a #math tutor");
//!     assert_eq!(store.read().posts.len(), 1);
//!     assert_eq!(post.tags, vec!["math"]);
//! }
//! ```
//!
//! # Architecture
//!
//! - [`client`] - configuration and the [`SyncClient`] facade
//! - [`mutations`] - the optimistic per-entity mutation surface
//! - [`reconcile`] - applies inbound events to the local store
//! - [`transport`] - the pub/sub adapter with probe and bounded retry
//! - [`resync`] - wholesale replacement from the snapshot endpoint
//! - [`connectivity`] - the connected flag and the event pump
//! - [`api`] / [`http`] - the HTTP seam (probe + snapshot)
//! - [`memory`] - in-process hub for tests and simulations

pub mod api;
pub mod client;
pub mod connectivity;
pub mod error;
pub mod http;
pub mod memory;
pub mod mutations;
pub mod reconcile;
pub mod resync;
pub mod transport;

// Re-exports for convenience
pub use api::ServerApi;
pub use client::{ClientConfig, ClientConfigBuilder, ClientEvent, SyncClient};
pub use connectivity::ConnectionMonitor;
pub use error::{ApiError, EngineError, Result, TransportError};
pub use http::HttpServerApi;
pub use memory::{MemoryApi, MemoryConnector, MemoryHub};
pub use reconcile::Reconciler;
pub use resync::resync;
pub use transport::{
    AdapterEvent, LinkEvent, SocketConnector, SocketLink, TransportAdapter, TransportConfig,
    TransportState,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::api::ServerApi;
    pub use crate::client::{ClientConfig, ClientEvent, SyncClient};
    pub use crate::memory::MemoryHub;
    pub use crate::transport::{SocketConnector, TransportState};
    pub use lectern_model::{
        Chat, ClientOp, Lesson, NewSlot, Notification, Post, ServerEvent, Slot, SyncSnapshot,
    };
    pub use lectern_store::{LocalStore, MemoryBackend, StorageBackend};
}
