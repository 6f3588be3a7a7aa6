//! Explicit context handoff between execution units.
//!
//! Context never follows work onto another thread by itself. The submitting
//! side captures a [`ContextSnapshot`], the worker installs it before running
//! the job and tears it down afterwards, so pooled threads never carry one
//! job's identifiers into the next.
//!
//! ```
//! use scoped_logger::{bridge, open};
//!
//! let _request = open("request_id", "req-9");
//! let snapshot = bridge::capture_for_handoff();
//!
//! std::thread::spawn(move || {
//!     bridge::install_on_worker(&snapshot);
//!     assert_eq!(bridge::capture_for_handoff().get("request_id"), Some("req-9"));
//!     bridge::teardown_after_handoff();
//!     assert!(bridge::capture_for_handoff().is_empty());
//! })
//! .join()
//! .unwrap();
//! ```

use std::marker::PhantomData;

use crate::{ContextSnapshot, store::ContextStore};

/// Captures the context of the calling execution unit.
#[must_use]
pub fn capture_for_handoff() -> ContextSnapshot {
    ContextStore::try_with_current(ContextStore::snapshot).unwrap_or_default()
}

/// Replaces the context of the calling execution unit with `snapshot`.
pub fn install_on_worker(snapshot: &ContextSnapshot) {
    ContextStore::with_current(|store| store.replace_with(snapshot));
}

/// Layers `snapshot` on top of the context of the calling execution unit.
pub fn install_on_worker_merged(snapshot: &ContextSnapshot) {
    ContextStore::with_current(|store| store.extend_from(snapshot));
}

/// Clears the context of the calling execution unit.
pub fn teardown_after_handoff() {
    // The store may already be gone when called from a thread-local destructor.
    let _ = ContextStore::try_with_current(ContextStore::clear_all);
}

/// Installs `snapshot` in place of the current context until the returned
/// guard is dropped.
///
/// Unlike [`install_on_worker`] and [`teardown_after_handoff`], the context
/// the thread had before is put back afterwards, so scopes that are still
/// open on it are left intact. Use this when the job may run on the
/// submitting thread.
pub fn enter<'a>(snapshot: &ContextSnapshot) -> HandoffGuard<'a> {
    let parked = ContextStore::from_snapshot(snapshot);
    ContextStore::with_current(|current| current.swap(&parked));
    HandoffGuard {
        parked,
        _marker: PhantomData,
    }
}

/// Puts the previous context back on drop, see [`enter`].
#[derive(Debug)]
#[must_use = "the handed off context is torn down as soon as the guard is dropped"]
pub struct HandoffGuard<'a> {
    // Holds the context of the thread while the handed off one is installed.
    parked: ContextStore,
    // Make this guard unsendable.
    _marker: PhantomData<&'a *mut ()>,
}

impl Drop for HandoffGuard<'_> {
    fn drop(&mut self) {
        // Whatever the job left behind is dropped together with the guard.
        let _ = ContextStore::try_with_current(|current| current.swap(&self.parked));
    }
}

impl ContextSnapshot {
    /// Wraps `job` so that it runs with this snapshot installed, on whatever
    /// thread ends up calling it. The context of that thread is restored
    /// once the job returns.
    pub fn bind<F, R>(self, job: F) -> impl FnOnce() -> R + Send
    where
        F: FnOnce() -> R + Send,
    {
        move || {
            let _handoff = enter(&self);
            job()
        }
    }
}
