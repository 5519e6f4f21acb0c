//! The server API seam: liveness probe and full-snapshot fetch.

use crate::error::ApiError;
use async_trait::async_trait;
use lectern_model::SyncSnapshot;

/// The two HTTP interactions the engine depends on. Implemented over
/// reqwest by [`crate::http::HttpServerApi`] and by in-memory stand-ins in
/// tests and simulations.
#[async_trait]
pub trait ServerApi: Send + Sync + 'static {
    /// Lightweight, short-timeout liveness check. `false` routes the engine
    /// to offline mode without attempting a transport connection.
    async fn probe(&self) -> bool;

    /// Fetch the complete authoritative snapshot of all collections.
    async fn fetch_snapshot(&self) -> Result<SyncSnapshot, ApiError>;
}
