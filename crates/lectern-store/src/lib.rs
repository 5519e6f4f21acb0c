//! Lectern Store - the durable per-collection cache behind the sync engine.
//!
//! Every entity collection the engine replicates lives here, behind a single
//! write lock so compound updates (a booking flipping a slot and inserting a
//! lesson) are atomic to every reader. Persistence goes through a pluggable
//! [`StorageBackend`]; a failed save is logged and the in-memory mutation
//! stands, so the engine keeps serving the best locally known state.

pub mod backend;
pub mod error;
pub mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use error::{Result, StoreError};
pub use store::{Collection, Collections, LocalStore, StoreWriter};
