//! The wire-level contract this crate consumes from an external cache
//! client. §6 names four operations (`GET`, `LEASE_GET`, `SET`,
//! `LEASE_SET`); this module gives them a single async trait and a result
//! type shaped around the "result-class discriminant, optional payload,
//! optional lease token" reply described there.

use async_trait::async_trait;

use crate::error::BoxError;

/// A 64-bit opaque token minted by the cache on a `LEASE_GET` miss.
///
/// See §3: [`LeaseToken::HOT_MISS`] is the reserved sentinel meaning another
/// requester already holds the real lease, and [`LeaseToken::NONE`] means no
/// lease is in play (leases disabled, or the plain read path was used).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeaseToken(pub u64);

impl LeaseToken {
    /// No active lease.
    pub const NONE: LeaseToken = LeaseToken(0);
    /// Another requester already holds the lease; back off and retry.
    pub const HOT_MISS: LeaseToken = LeaseToken(1);

    /// True for any token other than [`LeaseToken::NONE`] or
    /// [`LeaseToken::HOT_MISS`] — i.e. one that authorizes a write.
    #[must_use]
    pub fn authorizes_write(self) -> bool {
        self != LeaseToken::NONE && self != LeaseToken::HOT_MISS
    }
}

/// The result of one `GET` or `LEASE_GET` call.
#[derive(Debug)]
pub enum CacheOutcome {
    /// The cache held a value for this key.
    Hit {
        /// The raw, previously-stored payload bytes.
        payload: Vec<u8>,
    },
    /// The cache had no value. `lease_token` is [`LeaseToken::NONE`] for a
    /// plain `GET`, and for `LEASE_GET` is either [`LeaseToken::HOT_MISS`]
    /// or a token that authorizes a subsequent write.
    Miss {
        /// The lease token returned alongside the miss, if any.
        lease_token: LeaseToken,
    },
    /// The call failed at the transport level (timeout, connection error,
    /// cache process unavailable, ...). Treated identically to a plain miss
    /// by the read path (§7), but kept distinct here so callers can log it.
    Error(BoxError),
}

/// The result of one `SET` or `LEASE_SET` call. Never inspected for control
/// flow — the write path is best-effort (§4.4) — but useful for logging.
#[derive(Debug)]
pub enum WriteOutcome {
    /// The cache accepted and stored the value.
    Stored,
    /// The cache rejected the write (e.g. a `LEASE_SET` whose token no
    /// longer names the current lease).
    NotStored,
    /// The call failed at the transport level.
    Error(BoxError),
}

/// The four cache-facing operations this crate's read/write paths issue.
///
/// Implementations own connection pooling, multiplexing, and wire encoding
/// — all explicitly out of scope for this crate (§1) — and are shared
/// (`Arc`-wrapped by callers) across every route instance using the same
/// `flavor`.
#[async_trait]
pub trait CacheClient: Send + Sync + 'static {
    /// Plain lookup; never returns a lease token.
    async fn get(&self, key: &[u8]) -> CacheOutcome;

    /// Lookup that also requests/observes a lease on miss.
    async fn lease_get(&self, key: &[u8]) -> CacheOutcome;

    /// Unconditional store with a TTL, in seconds.
    async fn set(&self, key: &[u8], value: &[u8], ttl_secs: i32) -> WriteOutcome;

    /// Conditional store, accepted only if `lease_token` still names the
    /// current lease for `key`.
    async fn lease_set(
        &self,
        key: &[u8],
        value: &[u8],
        ttl_secs: i32,
        lease_token: LeaseToken,
    ) -> WriteOutcome;
}
