//! Keyed store of parameter filters.
//!
//! Filters are indexed by their canonical (ASCII upper-case) key, so
//! `"Styles"`, `"STYLES"` and `"styles"` all address the same entry. The
//! filter itself keeps the key casing it was declared with.

use std::collections::BTreeMap;

use super::filter::{canonical_key, ParameterFilter};

/// Parameter filters of a layer, keyed case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParameterFilterStore {
    filters: BTreeMap<String, ParameterFilter>,
}

impl ParameterFilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a filter, replacing any filter with the same canonical key.
    ///
    /// Returns `true` if an existing entry was replaced.
    pub fn add(&mut self, filter: ParameterFilter) -> bool {
        self.filters
            .insert(canonical_key(filter.key()), filter)
            .is_some()
    }

    /// Remove the filter registered under `key`.
    ///
    /// Returns `true` if something was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.filters.remove(&canonical_key(key)).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&ParameterFilter> {
        self.filters.get(&canonical_key(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ParameterFilter> {
        self.filters.get_mut(&canonical_key(key))
    }

    /// Snapshot of every filter. Later changes to the store are not
    /// reflected in the returned vector.
    pub fn get_all(&self) -> Vec<ParameterFilter> {
        self.filters.values().cloned().collect()
    }

    /// Canonical keys currently in the store.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl FromIterator<ParameterFilter> for ParameterFilterStore {
    fn from_iter<I: IntoIterator<Item = ParameterFilter>>(iter: I) -> Self {
        let mut store = Self::new();
        for filter in iter {
            store.add(filter);
        }
        store
    }
}
