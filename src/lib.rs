#![forbid(unsafe_code, future_incompatible)]
#![deny(
    missing_docs,
    nonstandard_style,
    unused_qualifications,
    unused_import_braces,
    unused_extern_crates,
    trivial_casts,
    trivial_numeric_casts
)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! A contention-safe **lookaside caching route** for request-routing trees.
//!
//! [`LookasideRoute`] sits as an interior node in front of a memcache-like
//! key/value cache. For each request it decides, via a pluggable
//! [`CachePolicy`], whether the request is cacheable; if so, it consults
//! the cache under a composed key and, on a hit, short-circuits the
//! routing tree by returning the deserialized reply. On a miss it forwards
//! to the downstream child, then stores the resulting reply back into the
//! cache without making its own caller wait for the write to land.
//!
//! The hard part this crate captures is the lookaside protocol's
//! concurrency behavior: lease-based miss coordination that stops a hot
//! key from triggering a thundering herd of duplicate recomputation,
//! exponential-backoff retry bounded by a configurable ceiling, key
//! splitting to smear hot-key contention across several physical cache
//! keys, and a best-effort detached write so a single request's cache
//! round-trips never block the worker driving it.
//!
//! This crate does **not** implement a routing tree, a cache transport, or
//! a cache router — those are injected collaborators (see [`Route`],
//! [`CacheClient`], and [`CacheRouterFactory`]).
//!
//! ## Basic usage
//!
//! ```
//! use std::sync::Arc;
//! use lookaside_cache::{
//!     CachePolicy, LookasideRoute, PostcardCodec, Route, RouteVisitor,
//! };
//! use lookaside_cache::key::{KeyComposer, KeySuffix};
//! use lookaside_cache::host::EnvHostIdentity;
//! use lookaside_cache::cache_client::{CacheClient, CacheOutcome, LeaseToken, WriteOutcome};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, serde::Serialize, serde::Deserialize)]
//! struct EchoReply(String);
//!
//! struct EchoChild;
//! #[async_trait]
//! impl Route<String, EchoReply> for EchoChild {
//!     async fn route(&self, req: String) -> EchoReply {
//!         EchoReply(req)
//!     }
//!     fn traverse(&self, _req: &String, _visitor: &mut dyn RouteVisitor<String>) {}
//!     fn route_name(&self) -> String {
//!         "echo".to_string()
//!     }
//! }
//!
//! struct AlwaysCacheable;
//! impl CachePolicy<String> for AlwaysCacheable {
//!     fn cacheable(&self, _req: &String) -> bool {
//!         true
//!     }
//!     fn build_key(&self, req: &String) -> Vec<u8> {
//!         req.clone().into_bytes()
//!     }
//!     fn name(&self) -> &str {
//!         "always"
//!     }
//! }
//!
//! struct NeverHit;
//! #[async_trait]
//! impl CacheClient for NeverHit {
//!     async fn get(&self, _key: &[u8]) -> CacheOutcome {
//!         CacheOutcome::Miss { lease_token: LeaseToken::NONE }
//!     }
//!     async fn lease_get(&self, _key: &[u8]) -> CacheOutcome {
//!         CacheOutcome::Miss { lease_token: LeaseToken::NONE }
//!     }
//!     async fn set(&self, _key: &[u8], _value: &[u8], _ttl: i32) -> WriteOutcome {
//!         WriteOutcome::Stored
//!     }
//!     async fn lease_set(&self, _key: &[u8], _value: &[u8], _ttl: i32, _token: LeaseToken) -> WriteOutcome {
//!         WriteOutcome::Stored
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let route = LookasideRoute::new(
//!     Arc::new(EchoChild),
//!     Arc::new(NeverHit),
//!     Arc::new(()),
//!     KeyComposer::new(b"p:".to_vec(), KeySuffix::compute(1, &EnvHostIdentity)),
//!     30,
//!     Arc::new(AlwaysCacheable),
//!     Arc::new(PostcardCodec),
//!     Default::default(),
//! );
//!
//! let reply = route.route("hello".to_string()).await;
//! assert_eq!(reply.0, "hello");
//! # }
//! ```

pub mod cache_client;
pub mod codec;
pub mod config;
pub mod error;
pub mod factory;
pub mod host;
pub mod key;
pub mod policy;
pub mod read;
mod runtime;
pub mod route;
pub mod write;

pub use cache_client::{CacheClient, CacheOutcome, LeaseToken, WriteOutcome};
pub use codec::{PostcardCodec, ReplyCodec};
pub use config::{LeaseSettings, RouteSettings};
pub use error::{BoxError, ConfigError, ConfigResult, RouterError};
pub use factory::{create_cache_route, CacheRouterFactory, MemoizingCacheRouterFactory, RouterAnchor};
pub use host::{EnvHostIdentity, FixedHostIdentity, HostIdentity};
pub use key::{KeyComposer, KeySuffix};
pub use policy::CachePolicy;
pub use route::{LookasideRoute, Route, RouteVisitor};
