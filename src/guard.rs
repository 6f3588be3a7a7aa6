//! A current logging context guard.

use std::marker::PhantomData;

use crate::{
    ContextValue, StaticCowStr,
    error::ScopeError,
    store::{ContextStore, UndoToken},
};

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Current,
    Store(&'a ContextStore),
}

impl Target<'_> {
    fn with<R>(self, f: impl FnOnce(&ContextStore) -> R) -> R {
        match self {
            Target::Current => ContextStore::with_current(f),
            Target::Store(store) => f(store),
        }
    }
}

/// A guard representing an open scope in a context store.
///
/// Every value pushed through the guard is removed again when the guard is
/// closed or dropped, restoring whatever the keys held before. This happens
/// exactly once, on every exit path.
///
/// Scopes on the same key must be closed in reverse order of opening.
/// Closing an outer scope first is a bug: [`ScopeGuard::close`] reports it as
/// [`ScopeError::OutOfOrder`], while dropping the guard panics in debug
/// builds and logs an error in release builds.
///
/// # Examples
///
/// ```
/// use scoped_logger::{LogContext, capture_for_handoff};
///
/// // Create a context with some data
/// let context = LogContext::new().record("user_id", 123);
///
/// // Enter the context (pushes to the store)
/// let guard = context.enter();
/// assert_eq!(capture_for_handoff().get("user_id"), Some("123"));
///
/// // When `guard` goes out of scope, the record is automatically removed
/// drop(guard);
/// assert!(capture_for_handoff().is_empty());
/// ```
#[derive(Debug)]
#[must_use = "the scope is closed as soon as the guard is dropped"]
pub struct ScopeGuard<'a> {
    target: Target<'a>,
    tokens: Vec<UndoToken>,
    // Make this guard unsendable.
    _marker: PhantomData<&'a *mut ()>,
}

impl<'a> ScopeGuard<'a> {
    pub(crate) const fn on_current() -> Self {
        Self {
            target: Target::Current,
            tokens: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub(crate) const fn on_store(store: &'a ContextStore) -> Self {
        Self {
            target: Target::Store(store),
            tokens: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Adds a record to this scope. It is released together with the others.
    pub fn record(&mut self, key: impl Into<StaticCowStr>, value: impl Into<ContextValue>) {
        let token = self.target.with(|store| store.put(key, value));
        self.tokens.push(token);
    }

    /// Closes the scope now.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::OutOfOrder`] if a newer scope on one of the keys
    /// is still open. The offending entries are discarded anyway so the
    /// store does not keep them forever.
    pub fn close(mut self) -> Result<(), ScopeError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), ScopeError> {
        let tokens = std::mem::take(&mut self.tokens);
        self.target.with(|store| {
            let mut outcome = Ok(());
            for token in tokens.into_iter().rev() {
                // The entries were swapped out while the scope was open, for
                // example into a future's own store during its poll.
                if !store.owns(&token) {
                    ContextStore::defer(token);
                    continue;
                }
                if let Err(err) = store.restore(&token) {
                    store.discard(&token);
                    if outcome.is_ok() {
                        outcome = Err(err);
                    }
                }
            }
            outcome
        })
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            report_misuse(&err);
        }
    }
}

pub(crate) fn report_misuse(err: &ScopeError) {
    if cfg!(debug_assertions) && !std::thread::panicking() {
        panic!("{err}");
    }
    log::error!(target: "scoped_logger", "{err}");
}
