//! The Cache Writer (§4.4): best-effort `SET`/`LEASE_SET`, with reply
//! serialization pinned to main-stack execution and the actual cache write
//! detached from the caller.

use std::sync::Arc;

use crate::cache_client::{CacheClient, LeaseToken, WriteOutcome};
use crate::codec::ReplyCodec;
use crate::runtime;

/// Serialize `reply` on the main stack, then fire off a detached `SET` (or
/// `LEASE_SET`, if leases are enabled and `lease_token` authorizes a write)
/// without waiting for it to land.
///
/// `reply` is expected to be a clone of whatever the child produced — the
/// route orchestrator keeps the original to return to its own caller while
/// this function consumes its own copy for storage (mirrors the
/// clone-in/move-out shape of this lineage's existing cache managers).
pub async fn dispatch_write<Reply>(
    client: Arc<dyn CacheClient>,
    codec: Arc<dyn ReplyCodec<Reply>>,
    key: Vec<u8>,
    reply: Reply,
    ttl_secs: i32,
    leases_enabled: bool,
    lease_token: LeaseToken,
) where
    Reply: Send + 'static,
{
    let key_for_log = key.clone();
    let payload = runtime::run_on_main_stack(move || codec.encode(&reply)).await;

    let payload = match payload {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!(
                "lookaside-cache: failed to serialize reply for key {:?}, skipping write: {err}",
                String::from_utf8_lossy(&key_for_log)
            );
            return;
        }
    };

    runtime::spawn_detached(async move {
        let outcome = if leases_enabled && lease_token.authorizes_write() {
            client.lease_set(&key, &payload, ttl_secs, lease_token).await
        } else {
            client.set(&key, &payload, ttl_secs).await
        };
        log_write_outcome(&key, &outcome);
    });
}

fn log_write_outcome(key: &[u8], outcome: &WriteOutcome) {
    match outcome {
        WriteOutcome::Stored => {
            log::debug!(
                "lookaside-cache: stored reply for key {:?}",
                String::from_utf8_lossy(key)
            );
        }
        WriteOutcome::NotStored => {
            log::debug!(
                "lookaside-cache: write for key {:?} was not stored (stale lease or eviction race)",
                String::from_utf8_lossy(key)
            );
        }
        WriteOutcome::Error(err) => {
            log::warn!(
                "lookaside-cache: write transport error for key {:?}: {err}",
                String::from_utf8_lossy(key)
            );
        }
    }
}
