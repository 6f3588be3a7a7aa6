//! Per-execution-unit context storage.

use std::{
    cell::{Cell, RefCell},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    ContextSnapshot, ContextValue, StaticCowStr,
    error::ScopeError,
    guard::{ScopeGuard, report_misuse},
};

thread_local! {
    static CURRENT_STORE: ContextStore = const { ContextStore::new() };
    // Tokens released while their entries were swapped out of the thread store.
    static DEFERRED: RefCell<Vec<UndoToken>> = const { RefCell::new(Vec::new()) };
}

// Entry ids are unique process-wide so that a token can never match an entry
// belonging to a different store swapped into the same thread.
static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);
// Same for the ids of store contents. Zero means not assigned yet.
static NEXT_CONTENTS_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct Entry {
    id: u64,
    key: StaticCowStr,
    value: String,
}

impl Entry {
    fn new(key: StaticCowStr, value: String) -> Self {
        Self {
            id: NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed),
            key,
            value,
        }
    }
}

/// Undo information returned by [`ContextStore::put`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping the token makes the pushed value permanent"]
pub struct UndoToken {
    id: u64,
    contents: u64,
    key: StaticCowStr,
    prior: Option<String>,
}

impl UndoToken {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value the key had before the push, `None` if it was absent.
    #[must_use]
    pub fn prior(&self) -> Option<&str> {
        self.prior.as_deref()
    }
}

/// An ordered key-value store with LIFO shadowing per key.
///
/// Every thread owns one store, reachable through [`ContextStore::with_current`].
/// Futures wrapped with [`FutureExt`](crate::FutureExt) carry their own store,
/// which is swapped in for the duration of each poll.
#[derive(Debug, Default)]
pub struct ContextStore {
    entries: RefCell<Vec<Entry>>,
    // Identifies the entries, travels with them on swap.
    contents: Cell<u64>,
}

impl ContextStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            contents: Cell::new(0),
        }
    }

    fn contents_id(&self) -> u64 {
        match self.contents.get() {
            0 => {
                let id = NEXT_CONTENTS_ID.fetch_add(1, Ordering::Relaxed);
                self.contents.set(id);
                id
            }
            id => id,
        }
    }

    /// Whether the entry pushed with `token` belongs to the contents of this store.
    pub(crate) fn owns(&self, token: &UndoToken) -> bool {
        self.contents.get() == token.contents
    }

    /// Creates a store preloaded with the contents of `snapshot`.
    #[must_use]
    pub fn from_snapshot(snapshot: &ContextSnapshot) -> Self {
        let store = Self::new();
        store.extend_from(snapshot);
        store
    }

    /// Runs `f` with the store of the calling thread.
    pub fn with_current<R>(f: impl FnOnce(&Self) -> R) -> R {
        CURRENT_STORE.with(f)
    }

    /// Same as [`ContextStore::with_current`], but returns `None` during thread teardown.
    pub fn try_with_current<R>(f: impl FnOnce(&Self) -> R) -> Option<R> {
        CURRENT_STORE.try_with(f).ok()
    }

    /// Pushes `value` for `key`, shadowing any current value.
    pub fn put(&self, key: impl Into<StaticCowStr>, value: impl Into<ContextValue>) -> UndoToken {
        let key = key.into();
        let value = value.into().into_string();
        let contents = self.contents_id();
        let mut entries = self.entries.borrow_mut();

        let prior = entries
            .iter()
            .rev()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.clone());
        let entry = Entry::new(key.clone(), value);
        let id = entry.id;
        entries.push(entry);

        UndoToken {
            id,
            contents,
            key,
            prior,
        }
    }

    /// Reverts the push described by `token`.
    ///
    /// A token whose entry is already gone, for example after
    /// [`ContextStore::clear_all`], is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::OutOfOrder`] if a newer value for the same key
    /// is still live. The store is left untouched in that case.
    pub fn restore(&self, token: &UndoToken) -> Result<(), ScopeError> {
        let mut entries = self.entries.borrow_mut();

        let Some(position) = entries.iter().position(|entry| entry.id == token.id) else {
            return Ok(());
        };
        let shadowed = entries[position + 1..]
            .iter()
            .any(|entry| entry.key == token.key);
        if shadowed {
            return Err(ScopeError::OutOfOrder {
                key: token.key.to_string(),
            });
        }

        entries.remove(position);
        Ok(())
    }

    /// Drops the entry pushed with `token` regardless of ordering.
    pub(crate) fn discard(&self, token: &UndoToken) {
        self.entries.borrow_mut().retain(|entry| entry.id != token.id);
    }

    /// Returns the current value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .borrow()
            .iter()
            .rev()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.clone())
    }

    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        let entries = self.entries.borrow();
        let mut flattened: Vec<(StaticCowStr, String)> = Vec::with_capacity(entries.len());
        for entry in entries.iter() {
            match flattened.iter_mut().find(|(key, _)| *key == entry.key) {
                Some(slot) => slot.1.clone_from(&entry.value),
                None => flattened.push((entry.key.clone(), entry.value.clone())),
            }
        }
        ContextSnapshot::from_entries(flattened)
    }

    pub fn clear_all(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Replaces the whole content of the store with `snapshot`.
    pub fn replace_with(&self, snapshot: &ContextSnapshot) {
        let mut entries = self.entries.borrow_mut();
        entries.clear();
        entries.extend(
            snapshot
                .entries()
                .iter()
                .map(|(key, value)| Entry::new(key.clone(), value.clone())),
        );
    }

    /// Pushes every entry of `snapshot` on top of the current content.
    pub fn extend_from(&self, snapshot: &ContextSnapshot) {
        self.entries.borrow_mut().extend(
            snapshot
                .entries()
                .iter()
                .map(|(key, value)| Entry::new(key.clone(), value.clone())),
        );
    }

    /// Opens a scope on this store.
    pub fn scope(
        &self,
        key: impl Into<StaticCowStr>,
        value: impl Into<ContextValue>,
    ) -> ScopeGuard<'_> {
        let mut guard = ScopeGuard::on_store(self);
        guard.record(key, value);
        guard
    }

    /// Number of live entries, shadowed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Exchanges the contents of two stores.
    ///
    /// Tokens deferred by [`ContextStore::defer`] for the contents that end up
    /// in `self` are settled right away.
    pub(crate) fn swap(&self, other: &Self) {
        self.entries.swap(&other.entries);
        self.contents.swap(&other.contents);
        self.settle_deferred();
    }

    /// Parks `token` until its contents are swapped back into a thread store.
    pub(crate) fn defer(token: UndoToken) {
        let _ = DEFERRED.try_with(|deferred| deferred.borrow_mut().push(token));
    }

    fn settle_deferred(&self) {
        let contents = self.contents.get();
        if contents == 0 {
            return;
        }
        let ready = DEFERRED
            .try_with(|deferred| {
                let mut deferred = deferred.borrow_mut();
                let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut *deferred)
                    .into_iter()
                    .partition(|token| token.contents == contents);
                *deferred = waiting;
                ready
            })
            .unwrap_or_default();

        for token in &ready {
            if let Err(err) = self.restore(token) {
                self.discard(token);
                report_misuse(&err);
            }
        }
    }
}
