//! The Key Composer (§4.2): assembles the final cache key from the route's
//! prefix, the helper-provided logical key, and a per-host split suffix.

use crate::host::HostIdentity;

/// The suffix appended to every composed key when `key_split_size > 1`.
///
/// Computed once at construction (invariant (ii) in §3) from
/// `key_split_size` and a [`HostIdentity`]; stable for the process
/// lifetime and never recomputed afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySuffix(Vec<u8>);

impl KeySuffix {
    /// Compute the suffix for a given split size and host identity.
    ///
    /// - `key_split_size <= 1` disables splitting: the suffix is empty.
    /// - Otherwise the suffix is the literal bytes `:ks` followed by the
    ///   decimal representation of `host_id mod key_split_size`.
    pub fn compute(key_split_size: u32, host: &dyn HostIdentity) -> Self {
        if key_split_size <= 1 {
            return KeySuffix(Vec::new());
        }
        let shard = host.host_id() % u64::from(key_split_size);
        KeySuffix(format!(":ks{shard}").into_bytes())
    }

    /// The raw suffix bytes, empty when splitting is disabled.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Composes the final physical cache key for a request.
#[derive(Debug, Clone)]
pub struct KeyComposer {
    prefix: Vec<u8>,
    suffix: KeySuffix,
}

impl KeyComposer {
    /// Build a composer from a prefix and a pre-computed suffix.
    #[must_use]
    pub fn new(prefix: Vec<u8>, suffix: KeySuffix) -> Self {
        Self { prefix, suffix }
    }

    /// `key_prefix || logical_key || key_suffix`.
    #[must_use]
    pub fn compose(&self, logical_key: &[u8]) -> Vec<u8> {
        let mut key =
            Vec::with_capacity(self.prefix.len() + logical_key.len() + self.suffix.as_bytes().len());
        key.extend_from_slice(&self.prefix);
        key.extend_from_slice(logical_key);
        key.extend_from_slice(self.suffix.as_bytes());
        key
    }

    /// The suffix this composer was built with — exposed for diagnostics
    /// and tests asserting invariant (iii) in §3.
    #[must_use]
    pub fn suffix(&self) -> &KeySuffix {
        &self.suffix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FixedHostIdentity;

    #[test]
    fn split_size_of_one_or_zero_disables_splitting() {
        assert!(KeySuffix::compute(1, &FixedHostIdentity(5)).as_bytes().is_empty());
        assert!(KeySuffix::compute(0, &FixedHostIdentity(5)).as_bytes().is_empty());
    }

    #[test]
    fn split_size_above_one_produces_ks_suffix() {
        let suffix = KeySuffix::compute(4, &FixedHostIdentity(6));
        assert_eq!(suffix.as_bytes(), b":ks2");
    }

    #[test]
    fn compose_concatenates_prefix_key_and_suffix() {
        let suffix = KeySuffix::compute(4, &FixedHostIdentity(6));
        let composer = KeyComposer::new(b"p:".to_vec(), suffix);
        assert_eq!(composer.compose(b"k"), b"p:k:ks2");
    }

    #[test]
    fn compose_with_no_split_has_bare_key() {
        let suffix = KeySuffix::compute(1, &FixedHostIdentity(6));
        let composer = KeyComposer::new(b"p:".to_vec(), suffix);
        assert_eq!(composer.compose(b"k"), b"p:k");
    }
}
