use crate::{ContextSnapshot, ContextValue, StaticCowStr, guard::ScopeGuard};

/// A set of context records waiting to be entered.
///
/// Records are pushed in the order they were added when the context is
/// entered, and removed together when the returned guard goes away.
#[derive(Debug, Clone, Default)]
pub struct LogContext(pub(crate) Vec<(StaticCowStr, ContextValue)>);

impl LogContext {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn record(mut self, key: impl Into<StaticCowStr>, value: impl Into<ContextValue>) -> Self {
        let property = (key.into(), value.into());
        self.0.push(property);
        self
    }

    /// Pushes the records onto the store of the calling execution unit.
    pub fn enter<'a>(self) -> ScopeGuard<'a> {
        let mut guard = ScopeGuard::on_current();
        for (key, value) in self.0 {
            guard.record(key, value);
        }
        guard
    }

    /// The records as they would look once entered on an empty store.
    #[must_use]
    pub fn to_snapshot(&self) -> ContextSnapshot {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.as_str().to_owned()))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Opens a scope that sets `key` to `value` on the calling execution unit.
///
/// # Examples
///
/// ```
/// use scoped_logger::{capture_for_handoff, open};
///
/// let _request = open("request_id", "req-1");
/// {
///     let _retry = open("request_id", "req-1-retry");
///     assert_eq!(capture_for_handoff().get("request_id"), Some("req-1-retry"));
/// }
/// assert_eq!(capture_for_handoff().get("request_id"), Some("req-1"));
/// ```
pub fn open<'a>(key: impl Into<StaticCowStr>, value: impl Into<ContextValue>) -> ScopeGuard<'a> {
    let mut guard = ScopeGuard::on_current();
    guard.record(key, value);
    guard
}
