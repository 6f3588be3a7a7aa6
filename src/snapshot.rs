//! Immutable views of a context store.

use std::sync::Arc;

use serde::ser::SerializeMap;

use crate::StaticCowStr;

/// An immutable, flattened view of a [`ContextStore`](crate::store::ContextStore).
///
/// Holds the most recently pushed value of every live key. Keys keep the
/// order in which they were first pushed. Cloning is cheap and the snapshot
/// can be moved between threads freely, which is the only way context
/// crosses execution units.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ContextSnapshot {
    entries: Arc<[(StaticCowStr, String)]>,
}

impl ContextSnapshot {
    /// Returns an empty snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<(StaticCowStr, String)>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(StaticCowStr, String)] {
        &self.entries
    }
}

impl std::fmt::Debug for ContextSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl serde::Serialize for ContextSnapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl log::kv::Source for ContextSnapshot {
    fn visit<'kvs>(
        &'kvs self,
        visitor: &mut dyn log::kv::VisitSource<'kvs>,
    ) -> Result<(), log::kv::Error> {
        for (key, value) in self.entries.iter() {
            visitor.visit_pair(log::kv::Key::from_str(key), log::kv::Value::from(&**value))?;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for ContextSnapshot
where
    K: Into<StaticCowStr>,
    V: Into<String>,
{
    /// Later pairs with a repeated key overwrite the earlier value in place.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut entries: Vec<(StaticCowStr, String)> = Vec::new();
        for (key, value) in iter {
            let key = key.into();
            let value = value.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Self::from_entries(entries)
    }
}
