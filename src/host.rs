//! The host-identity seam behind key splitting (§4.2, §9 "Key-split
//! determinism"). The suffix a route computes at construction is a pure
//! function of `key_split_size` and a stable per-process host id; tests
//! need to pin that id rather than depend on the real environment.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Supplies the stable per-process identifier used to derive the key-split
/// suffix.
pub trait HostIdentity: Send + Sync + 'static {
    /// A value stable for the lifetime of the process. Only `value mod
    /// key_split_size` is ever observed, so implementations don't need to
    /// produce a globally unique id — just one that varies across hosts.
    fn host_id(&self) -> u64;
}

/// Default [`HostIdentity`]: hashes the process hostname (falling back to
/// the process id if the hostname can't be read) once, then returns the
/// cached value for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvHostIdentity;

impl HostIdentity for EnvHostIdentity {
    fn host_id(&self) -> u64 {
        static CACHED: OnceLock<u64> = OnceLock::new();
        *CACHED.get_or_init(|| {
            let seed = std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("COMPUTERNAME"))
                .unwrap_or_else(|_| std::process::id().to_string());
            fnv1a_hash(seed.as_bytes())
        })
    }
}

/// A fixed [`HostIdentity`] for tests that need a deterministic suffix.
#[derive(Debug, Clone, Copy)]
pub struct FixedHostIdentity(pub u64);

impl HostIdentity for FixedHostIdentity {
    fn host_id(&self) -> u64 {
        self.0
    }
}

/// A [`HostIdentity`] backed by a shared counter, useful when a test wants
/// each constructed route to observe a different host id.
#[derive(Debug, Default)]
pub struct CountingHostIdentity(AtomicU64);

impl HostIdentity for CountingHostIdentity {
    fn host_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

fn fnv1a_hash(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    bytes.iter().fold(OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}
