//! Configuration schema (§6) and validation (§7's "Malformed configuration"
//! row). `child` itself is opaque to this crate — composing the downstream
//! route from its sub-spec is the routing tree framework's job — so parsing
//! here only covers the keys this node interprets directly. The factory
//! still checks for `child`'s presence so "missing child" surfaces as the
//! same `ConfigError` the spec names.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};

/// Parsed `lease_settings` sub-object (§6).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LeaseSettings {
    /// Whether the lease-based read/write protocol is used at all.
    pub enable_leases: bool,
    /// Initial backoff between lease-read retries, in milliseconds.
    pub initial_wait_ms: i32,
    /// Backoff ceiling, in milliseconds.
    pub max_wait_ms: i32,
    /// Maximum number of retries before giving up on a hot miss.
    pub num_retries: i32,
}

impl Default for LeaseSettings {
    fn default() -> Self {
        Self {
            enable_leases: false,
            initial_wait_ms: 2,
            max_wait_ms: 500,
            num_retries: 10,
        }
    }
}

impl LeaseSettings {
    fn validate(self) -> ConfigResult<Self> {
        if self.initial_wait_ms < 0 || self.max_wait_ms < 0 {
            return Err(ConfigError::NegativeLeaseBackoff {
                initial: self.initial_wait_ms,
                max: self.max_wait_ms,
            });
        }
        if self.initial_wait_ms > self.max_wait_ms {
            return Err(ConfigError::InvalidLeaseBackoff {
                initial: self.initial_wait_ms,
                max: self.max_wait_ms,
            });
        }
        if self.num_retries < 0 {
            return Err(ConfigError::NegativeNumRetries(self.num_retries));
        }
        Ok(self)
    }
}

/// The subset of a route's configuration this crate parses directly from a
/// JSON object, per §6's table (everything but `child`, which the
/// embedding routing-tree framework resolves on its own).
#[derive(Debug, Clone)]
pub struct RouteSettings {
    /// Applied to every cache write.
    pub ttl_secs: i32,
    /// Cache key prefix; may be empty.
    pub prefix: Vec<u8>,
    /// Selector for the cache router profile.
    pub flavor: String,
    /// Number of distinct physical keys per logical request.
    pub key_split_size: u32,
    /// Opaque helper-constructor configuration, passed through verbatim.
    pub helper_config: Option<Value>,
    /// Lease-based miss-coordination settings.
    pub lease_settings: LeaseSettings,
}

const DEFAULT_FLAVOR: &str = "web";
const DEFAULT_KEY_SPLIT_SIZE: u32 = 1;

impl RouteSettings {
    /// Parse and validate a route's settings from its configuration object.
    ///
    /// `value` is expected to be the JSON object described in §6; `child`'s
    /// presence is checked (but its contents are not interpreted) so that a
    /// config missing a downstream route fails the same way a config
    /// missing `ttl` does.
    pub fn from_value(value: &Value) -> ConfigResult<Self> {
        let object = value.as_object().ok_or_else(|| ConfigError::WrongType {
            key: "<root>",
            message: "expected a JSON object".to_string(),
        })?;

        if !object.contains_key("child") {
            return Err(ConfigError::MissingField("child"));
        }

        let ttl_secs = match object.get("ttl") {
            None => return Err(ConfigError::MissingField("ttl")),
            Some(v) => v.as_i64().ok_or_else(|| ConfigError::WrongType {
                key: "ttl",
                message: "expected an integer number of seconds".to_string(),
            })?,
        };
        let ttl_secs = i32::try_from(ttl_secs).map_err(|_| ConfigError::WrongType {
            key: "ttl",
            message: format!("{ttl_secs} does not fit in an i32"),
        })?;

        let prefix = match object.get("prefix") {
            None => Vec::new(),
            Some(Value::String(s)) => s.clone().into_bytes(),
            Some(_) => {
                return Err(ConfigError::WrongType {
                    key: "prefix",
                    message: "expected a string".to_string(),
                })
            }
        };

        let flavor = match object.get("flavor") {
            None => DEFAULT_FLAVOR.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(ConfigError::WrongType {
                    key: "flavor",
                    message: "expected a string".to_string(),
                })
            }
        };

        let key_split_size = match object.get("key_split_size") {
            None => DEFAULT_KEY_SPLIT_SIZE,
            Some(v) => {
                let raw = v.as_i64().ok_or_else(|| ConfigError::WrongType {
                    key: "key_split_size",
                    message: "expected a positive integer".to_string(),
                })?;
                if raw <= 0 {
                    return Err(ConfigError::NonPositiveKeySplitSize(raw));
                }
                u32::try_from(raw).map_err(|_| ConfigError::WrongType {
                    key: "key_split_size",
                    message: format!("{raw} does not fit in a u32"),
                })?
            }
        };

        let helper_config = object.get("helper_config").cloned();

        let lease_settings = match object.get("lease_settings") {
            None => LeaseSettings::default(),
            Some(v) => {
                let parsed: LeaseSettings =
                    serde_json::from_value(v.clone())?;
                parsed.validate()?
            }
        };

        Ok(Self {
            ttl_secs,
            prefix,
            flavor,
            key_split_size,
            helper_config,
            lease_settings,
        })
    }
}
