//! Cooperative-scheduling seams used by the read/write paths.
//!
//! §5 of the design requires three primitives: a way to suspend on a cache
//! reply, a way to suspend between lease-retry attempts, and a way to run
//! reply serialization outside the calling task's (small) stack before
//! handing the resulting bytes to a detached write task. This module is the
//! single place that talks to the underlying async runtime, mirroring the
//! teacher's `runtime.rs` split between backends — currently only `tokio` is
//! wired up, but the seam stays so a second backend slots in without
//! touching `read`, `write`, or `route`.

use std::future::Future;
use std::time::Duration;

cfg_if::cfg_if! {
    if #[cfg(not(any()))] {
        /// Suspend the calling task for `duration`. Used between lease-read
        /// retry attempts (§4.3 step 2a).
        pub async fn sleep(duration: Duration) {
            tokio::time::sleep(duration).await;
        }

        /// Fire-and-forget a future onto the same scheduler the caller is
        /// running on. The returned handle is intentionally dropped by
        /// callers: the write path's contract (§4.4) is that `route()` never
        /// awaits completion.
        pub fn spawn_detached<F>(future: F)
        where
            F: Future<Output = ()> + Send + 'static,
        {
            tokio::spawn(future);
        }

        /// Run a blocking closure on a worker thread dedicated to
        /// non-cooperative work, then resume the calling task with its
        /// result.
        ///
        /// Reply serialization (§4.4) must not run on a small fiber/task
        /// stack because the injected codec may allocate or recurse in ways
        /// that are unsafe there. `tokio::task::spawn_blocking` is this
        /// runtime's equivalent of "switch to the underlying OS thread's
        /// main stack".
        pub async fn run_on_main_stack<F, R>(f: F) -> R
        where
            F: FnOnce() -> R + Send + 'static,
            R: Send + 'static,
        {
            match tokio::task::spawn_blocking(f).await {
                Ok(value) => value,
                Err(join_error) => {
                    // The closure itself is infallible; only a panic inside
                    // it (or runtime shutdown) lands here. Propagate the
                    // panic rather than hide a corrupted serialization.
                    std::panic::resume_unwind(join_error.into_panic());
                }
            }
        }
    }
}
