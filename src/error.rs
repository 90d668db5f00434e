//! The two error taxonomies this crate raises: [`ConfigError`] for
//! malformed configuration (always fatal, propagated to the caller) and
//! [`RouterError`] for a missing runtime collaborator (always degraded,
//! logged and swallowed by [`crate::factory::create_cache_route`]).

use thiserror::Error;

/// A type-erased transport error, as returned by a [`CacheClient`](crate::CacheClient)
/// implementation for a single `GET`/`LEASE_GET`/`SET`/`LEASE_SET` call.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A `Result` typedef to use with the [`ConfigError`] type.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors that prevent a [`LookasideRoute`](crate::LookasideRoute) from being constructed.
///
/// These are always fatal: the factory reports them to the caller instead of
/// degrading, because they indicate the configuration object itself is
/// malformed rather than a missing runtime collaborator (see
/// [`RouterError`] for the latter).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required key was missing from the configuration object.
    #[error("missing required config key `{0}`")]
    MissingField(&'static str),
    /// A key was present but held a value of the wrong JSON type.
    #[error("config key `{key}` has the wrong type: {message}")]
    WrongType {
        /// The offending key.
        key: &'static str,
        /// Human-readable description of the mismatch.
        message: String,
    },
    /// `key_split_size` was zero or negative.
    #[error("key_split_size must be a positive integer, got {0}")]
    NonPositiveKeySplitSize(i64),
    /// `lease_settings.initial_wait_ms` exceeded `lease_settings.max_wait_ms`.
    #[error(
        "lease_settings.initial_wait_ms ({initial}) must be <= max_wait_ms ({max})"
    )]
    InvalidLeaseBackoff {
        /// Configured initial wait, in milliseconds.
        initial: i32,
        /// Configured max wait, in milliseconds.
        max: i32,
    },
    /// `lease_settings.initial_wait_ms` or `lease_settings.max_wait_ms` was negative.
    #[error(
        "lease_settings.initial_wait_ms ({initial}) and max_wait_ms ({max}) must both be >= 0"
    )]
    NegativeLeaseBackoff {
        /// Configured initial wait, in milliseconds.
        initial: i32,
        /// Configured max wait, in milliseconds.
        max: i32,
    },
    /// `lease_settings.num_retries` was negative.
    #[error("lease_settings.num_retries must be >= 0, got {0}")]
    NegativeNumRetries(i32),
    /// The underlying `serde_json` value could not be deserialized at all.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced while acquiring the cache router or cache client that a
/// [`LookasideRoute`](crate::LookasideRoute) needs at construction time.
///
/// Per the construction-failure policy, these are never propagated past the
/// factory: they're logged and the factory falls back to returning the raw
/// child route instead of wrapping it.
#[derive(Error, Debug)]
pub enum RouterError {
    /// The [`CacheRouterFactory`](crate::CacheRouterFactory) failed to produce
    /// or locate a router for the requested `persistence_id`.
    #[error("failed to acquire cache router for `{persistence_id}`: {source}")]
    RouterUnavailable {
        /// The persistence id that was requested.
        persistence_id: String,
        /// The underlying cause.
        #[source]
        source: BoxError,
    },
    /// The router was acquired but could not hand back a usable cache client.
    #[error("failed to create cache client: {0}")]
    ClientUnavailable(#[source] BoxError),
}
