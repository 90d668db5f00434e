//! The Policy Adapter (§4.1): a thin, stateless delegation to a
//! user-supplied helper that decides cacheability and builds logical keys.

/// The capability a "helper" must provide for a request type to be fronted
/// by a [`LookasideRoute`](crate::LookasideRoute).
///
/// Implementations must be safe to call concurrently from multiple workers
/// without the core taking any lock on their behalf (§4.1) — if a helper
/// needs internal state, it is responsible for synchronizing it.
pub trait CachePolicy<Req>: Send + Sync {
    /// May this request be cached at all?
    fn cacheable(&self, req: &Req) -> bool;

    /// The request's logical cache key, before prefix/suffix composition.
    fn build_key(&self, req: &Req) -> Vec<u8>;

    /// A short diagnostic label, used in [`route_name`](crate::LookasideRoute::route_name).
    fn name(&self) -> &str;
}
