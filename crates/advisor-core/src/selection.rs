//! The user's chosen catalog items and their persistence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::catalog::Catalog;
use crate::{Error, Result, SelectionStore};

/// Storage key holding the JSON-encoded id list.
pub const SELECTION_KEY: &str = "selectedProducts";

/// Ordered, duplicate-free list of selected product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState {
    ids: Vec<u64>,
}

impl SelectionState {
    pub fn from_ids<I: IntoIterator<Item = u64>>(ids: I) -> Self {
        let mut s = Self::default();
        for id in ids {
            if !s.contains(id) {
                s.ids.push(id);
            }
        }
        s
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: u64) -> bool {
        if self.remove(id) {
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    /// Returns whether `id` was selected.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.ids.len();
        self.ids.retain(|x| *x != id);
        self.ids.len() != before
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Swap the whole selection for `ids` (deduplicated, order kept).
    pub fn replace<I: IntoIterator<Item = u64>>(&mut self, ids: I) {
        *self = Self::from_ids(ids);
    }

    /// Drop ids the catalog does not know.
    pub fn retain_known(&mut self, catalog: &Catalog) {
        self.ids.retain(|id| catalog.contains(*id));
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.ids).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let ids: Vec<u64> = serde_json::from_str(s).map_err(|e| Error::Store(e.to_string()))?;
        Ok(Self::from_ids(ids))
    }

    /// Missing key means an empty selection.
    pub fn load(store: &dyn SelectionStore) -> Result<Self> {
        match store.get(SELECTION_KEY)? {
            Some(raw) if !raw.trim().is_empty() => Self::from_json(&raw),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, store: &dyn SelectionStore) -> Result<()> {
        store.set(SELECTION_KEY, &self.to_json())
    }
}

/// A selection bound to its store: every mutation is written through before returning.
pub struct PersistedSelection<S: SelectionStore> {
    store: S,
    state: SelectionState,
}

impl<S: SelectionStore> PersistedSelection<S> {
    pub fn load(store: S) -> Result<Self> {
        let state = SelectionState::load(&store)?;
        Ok(Self { store, state })
    }

    /// Load, keeping only ids present in `catalog`.
    pub fn load_known(store: S, catalog: &Catalog) -> Result<Self> {
        let mut me = Self::load(store)?;
        me.state.retain_known(catalog);
        Ok(me)
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn toggle(&mut self, id: u64) -> Result<bool> {
        let selected = self.state.toggle(id);
        self.state.save(&self.store)?;
        Ok(selected)
    }

    /// Toggle only ids the catalog knows.
    pub fn toggle_known(&mut self, catalog: &Catalog, id: u64) -> Result<bool> {
        if !catalog.contains(id) {
            return Err(Error::Validation(format!("unknown product id {id}")));
        }
        self.toggle(id)
    }

    pub fn remove(&mut self, id: u64) -> Result<bool> {
        let removed = self.state.remove(id);
        self.state.save(&self.store)?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.state.clear();
        self.state.save(&self.store)
    }

    pub fn replace<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> Result<()> {
        self.state.replace(ids);
        self.state.save(&self.store)
    }
}

/// In-process store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<String, String>>,
}

impl SelectionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let m = self
            .inner
            .read()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        Ok(m.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut m = self
            .inner
            .write()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        m.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: SelectionStore + ?Sized> SelectionStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
