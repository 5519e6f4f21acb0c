//! The full-resync protocol: fetch one authoritative snapshot and replace
//! the local collections wholesale.

use crate::api::ServerApi;
use crate::error::ApiError;
use lectern_store::LocalStore;
use tracing::info;

/// Fetch the complete snapshot and replace every local collection with it.
///
/// Any failure mode - network error, timeout, non-success status, wrong
/// content type, unparsable body - is a strict no-op with respect to local
/// state: the engine keeps operating on whatever data it already has.
///
/// Note that a successful resync also replaces entities that were mutated
/// locally while offline and never transmitted; those edits are superseded
/// by the authoritative snapshot rather than replayed.
pub async fn resync(api: &dyn ServerApi, store: &LocalStore) -> Result<(), ApiError> {
    let snapshot = api.fetch_snapshot().await?;
    store.replace_all(snapshot);
    info!("full resync applied");
    Ok(())
}
