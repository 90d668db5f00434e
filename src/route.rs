//! The Route Orchestrator (§4.5) and the minimal routing-tree seam
//! ([`Route`], [`RouteVisitor`]) this crate needs from its external
//! collaborator — the routing tree framework itself, which composes route
//! handles and drives traversal, stays out of scope (§1); this is just
//! enough surface for a [`LookasideRoute`] to sit as one interior node.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache_client::{CacheClient, LeaseToken};
use crate::codec::ReplyCodec;
use crate::config::LeaseSettings;
use crate::key::KeyComposer;
use crate::policy::CachePolicy;
use crate::read::{lease_read, plain_read};
use crate::write::dispatch_write;

/// A node in a request-routing tree: something that can turn a request into
/// a reply, and that a diagnostic walk can visit.
#[async_trait]
pub trait Route<Req, Reply>: Send + Sync + 'static {
    /// Route `req` to a reply.
    async fn route(&self, req: Req) -> Reply;

    /// Walk this node (and, for composite nodes, its children) with
    /// `visitor`.
    fn traverse(&self, req: &Req, visitor: &mut dyn RouteVisitor<Req>);

    /// A diagnostic label identifying this node's configuration.
    fn route_name(&self) -> String;
}

/// Receives a callback for each node a [`Route::traverse`] walk visits.
pub trait RouteVisitor<Req> {
    /// Called once per visited node, with that node's [`Route::route_name`]
    /// and the request being traversed.
    fn visit(&mut self, route_name: &str, req: &Req);
}

/// A lookaside caching route: an interior node that consults an external
/// cache ahead of its child, using a pluggable [`CachePolicy`] to decide
/// cacheability and a contention-safe lease protocol to avoid thundering
/// herds on a hot miss.
///
/// See the crate-level docs for the full request lifecycle. Instances are
/// immutable after construction (§3 invariants) and are built through
/// [`crate::factory::create_cache_route`] rather than directly, so that the
/// construction-failure degrade-to-child policy (§4.5, §7) is always
/// applied.
pub struct LookasideRoute<Req, Reply> {
    child: Arc<dyn Route<Req, Reply>>,
    cache_client: Arc<dyn CacheClient>,
    /// Kept only to keep the shared cache router alive for as long as this
    /// route exists; never otherwise read.
    router_anchor: Arc<dyn Any + Send + Sync>,
    key_composer: KeyComposer,
    ttl_secs: i32,
    policy: Arc<dyn CachePolicy<Req>>,
    codec: Arc<dyn ReplyCodec<Reply>>,
    lease_settings: LeaseSettings,
}

impl<Req, Reply> LookasideRoute<Req, Reply> {
    /// Assemble a route from its already-resolved collaborators.
    ///
    /// Prefer [`crate::factory::create_cache_route`] unless you're wiring
    /// the cache router/client up yourself outside the standard config
    /// flow (e.g. in tests).
    #[must_use]
    pub fn new(
        child: Arc<dyn Route<Req, Reply>>,
        cache_client: Arc<dyn CacheClient>,
        router_anchor: Arc<dyn Any + Send + Sync>,
        key_composer: KeyComposer,
        ttl_secs: i32,
        policy: Arc<dyn CachePolicy<Req>>,
        codec: Arc<dyn ReplyCodec<Reply>>,
        lease_settings: LeaseSettings,
    ) -> Self {
        Self {
            child,
            cache_client,
            router_anchor,
            key_composer,
            ttl_secs,
            policy,
            codec,
            lease_settings,
        }
    }

    /// The composed physical key this route would use for `req` — exposed
    /// so tests can assert invariants 2 and 3 from §8 directly.
    #[must_use]
    pub fn cache_key_for(&self, req: &Req) -> Vec<u8> {
        self.key_composer.compose(&self.policy.build_key(req))
    }
}

#[async_trait]
impl<Req, Reply> Route<Req, Reply> for LookasideRoute<Req, Reply>
where
    Req: Send + 'static,
    Reply: Clone + Send + 'static,
{
    async fn route(&self, req: Req) -> Reply {
        let candidate = self.policy.cacheable(&req);

        let (key, lease_token) = if candidate {
            let key = self.cache_key_for(&req);
            let read_outcome = if self.lease_settings.enable_leases {
                lease_read(
                    self.cache_client.as_ref(),
                    self.codec.as_ref(),
                    &key,
                    &self.lease_settings,
                )
                .await
            } else {
                plain_read(self.cache_client.as_ref(), self.codec.as_ref(), &key).await
            };

            if let Some(reply) = read_outcome.reply {
                return reply;
            }
            (Some(key), read_outcome.lease_token)
        } else {
            (None, LeaseToken::NONE)
        };

        let reply = self.child.route(req).await;

        if let Some(key) = key {
            dispatch_write(
                Arc::clone(&self.cache_client),
                Arc::clone(&self.codec),
                key,
                reply.clone(),
                self.ttl_secs,
                self.lease_settings.enable_leases,
                lease_token,
            )
            .await;
        }

        reply
    }

    fn traverse(&self, req: &Req, visitor: &mut dyn RouteVisitor<Req>) {
        // The lookaside itself is invisible to tree traversal (§4.5).
        self.child.traverse(req, visitor);
    }

    fn route_name(&self) -> String {
        format!(
            "lookaside-cache|name={}|ttl={}s|leases={}",
            self.policy.name(),
            self.ttl_secs,
            self.lease_settings.enable_leases
        )
    }
}
