//! Router acquisition (§6) and the construction-failure degrade policy
//! (§4.5, §7): `create_cache_route` either returns a working
//! [`LookasideRoute`] or, if the cache router/client can't be obtained,
//! logs and hands back the raw child untouched.

use std::any::Any;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

use crate::cache_client::CacheClient;
use crate::config::RouteSettings;
use crate::error::{ConfigResult, RouterError};
use crate::host::HostIdentity;
use crate::key::{KeyComposer, KeySuffix};
use crate::policy::CachePolicy;
use crate::codec::ReplyCodec;
use crate::route::{LookasideRoute, Route};

/// A type-erased handle kept alive by every route sharing a cache router,
/// so the router is torn down only once the last route drops it.
pub type RouterAnchor = Arc<dyn Any + Send + Sync>;

/// Resolves (and, per §6, memoizes) the cache router and cache client for a
/// given `persistence_id`/`flavor` pair.
///
/// This is the injected bootstrapping seam spec.md calls out as an external
/// collaborator — this crate only defines the contract, never the
/// transport underneath it.
pub trait CacheRouterFactory: Send + Sync + 'static {
    /// Acquire the router for `persistence_id`, returning a keep-alive
    /// anchor and the cache client it exposes for `flavor`.
    fn create_cache_router(
        &self,
        persistence_id: &str,
        flavor: &str,
    ) -> Result<(RouterAnchor, Arc<dyn CacheClient>), RouterError>;
}

/// A [`CacheRouterFactory`] that builds a router at most once per
/// `persistence_id` and hands every subsequent caller the same instance —
/// the sharing behavior §6 requires of "the same persistenceId".
pub struct MemoizingCacheRouterFactory<B> {
    builder: B,
    routers: DashMap<String, (RouterAnchor, Arc<dyn CacheClient>)>,
}

impl<B> MemoizingCacheRouterFactory<B>
where
    B: Fn(&str) -> Result<(RouterAnchor, Arc<dyn CacheClient>), RouterError>
        + Send
        + Sync
        + 'static,
{
    /// Wrap a one-shot router-construction closure with memoization.
    pub fn new(builder: B) -> Self {
        Self { builder, routers: DashMap::new() }
    }
}

impl<B> CacheRouterFactory for MemoizingCacheRouterFactory<B>
where
    B: Fn(&str) -> Result<(RouterAnchor, Arc<dyn CacheClient>), RouterError>
        + Send
        + Sync
        + 'static,
{
    fn create_cache_router(
        &self,
        persistence_id: &str,
        _flavor: &str,
    ) -> Result<(RouterAnchor, Arc<dyn CacheClient>), RouterError> {
        // Building happens inside the `entry()` match so the shard lock is
        // held for the duration of construction — two concurrent callers for
        // the same `persistence_id` can't both invoke `builder` (§6: "the
        // same persistenceId" shares one router instance).
        match self.routers.entry(persistence_id.to_string()) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(vacant) => {
                let created = (self.builder)(persistence_id)?;
                Ok(vacant.insert(created).clone())
            }
        }
    }
}

/// Build a [`LookasideRoute`] from its JSON configuration object (§6),
/// falling back to the raw `child` if the cache router/client can't be
/// acquired (§4.5's construction-failure policy). Malformed configuration
/// is the only failure mode this function itself propagates — it is
/// checked and rejected before any router acquisition is attempted.
///
/// `build_policy` receives the parsed `helper_config` object (if any) and
/// constructs the user-supplied [`CachePolicy`] helper; it is only called
/// once router acquisition has already succeeded, since a route that's
/// about to degrade to its raw child has no use for a helper.
pub fn create_cache_route<Req, Reply, H>(
    router_factory: &dyn CacheRouterFactory,
    child: Arc<dyn Route<Req, Reply>>,
    config: &Value,
    build_policy: H,
    codec: Arc<dyn ReplyCodec<Reply>>,
    host: &dyn HostIdentity,
) -> ConfigResult<Arc<dyn Route<Req, Reply>>>
where
    Req: Send + 'static,
    Reply: Clone + Send + 'static,
    H: FnOnce(Option<&Value>) -> Arc<dyn CachePolicy<Req>>,
{
    let settings = RouteSettings::from_value(config)?;
    let persistence_id = format!("CarbonLookasideClient:{}", settings.flavor);

    match router_factory.create_cache_router(&persistence_id, &settings.flavor) {
        Ok((router_anchor, cache_client)) => {
            let policy = build_policy(settings.helper_config.as_ref());
            let suffix = KeySuffix::compute(settings.key_split_size, host);
            let key_composer = KeyComposer::new(settings.prefix, suffix);
            let route = LookasideRoute::new(
                child,
                cache_client,
                router_anchor,
                key_composer,
                settings.ttl_secs,
                policy,
                codec,
                settings.lease_settings,
            );
            Ok(Arc::new(route))
        }
        Err(err) => {
            log::warn!(
                "lookaside-cache: could not acquire cache router for persistence id {persistence_id:?}, degrading to raw child: {err}"
            );
            Ok(child)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBuilder(AtomicUsize);

    fn fake_client() -> Arc<dyn CacheClient> {
        use crate::cache_client::{CacheOutcome, LeaseToken, WriteOutcome};
        use async_trait::async_trait;

        struct Noop;
        #[async_trait]
        impl CacheClient for Noop {
            async fn get(&self, _key: &[u8]) -> CacheOutcome {
                CacheOutcome::Miss { lease_token: LeaseToken::NONE }
            }
            async fn lease_get(&self, _key: &[u8]) -> CacheOutcome {
                CacheOutcome::Miss { lease_token: LeaseToken::NONE }
            }
            async fn set(&self, _key: &[u8], _value: &[u8], _ttl: i32) -> WriteOutcome {
                WriteOutcome::Stored
            }
            async fn lease_set(
                &self,
                _key: &[u8],
                _value: &[u8],
                _ttl: i32,
                _token: LeaseToken,
            ) -> WriteOutcome {
                WriteOutcome::Stored
            }
        }
        Arc::new(Noop)
    }

    #[test]
    fn memoizing_factory_builds_once_per_persistence_id() {
        let counter = Arc::new(CountingBuilder(AtomicUsize::new(0)));
        let counter_clone = Arc::clone(&counter);
        let factory = MemoizingCacheRouterFactory::new(move |_id| {
            counter_clone.0.fetch_add(1, Ordering::SeqCst);
            Ok((Arc::new(()) as RouterAnchor, fake_client()))
        });

        let first = factory.create_cache_router("CarbonLookasideClient:web", "web").unwrap();
        let second = factory.create_cache_router("CarbonLookasideClient:web", "web").unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first.0, &second.0));

        let _ = factory.create_cache_router("CarbonLookasideClient:mobile", "mobile");
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }
}
