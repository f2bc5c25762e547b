//! Liveness registry that observes cached instances without owning them.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Weak},
};

/// Map from key to a weak handle on the last instance produced for it.
///
/// A handle never keeps its target alive; once every strong holder is gone
/// the handle reads as absent until [`WeakRegistry::sweep`] drops it.
#[derive(Debug)]
pub struct WeakRegistry<K, V> {
    handles: HashMap<K, Weak<V>>,
}

impl<K, V> Default for WeakRegistry<K, V> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }
}

impl<K, V> WeakRegistry<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Upgrade the handle for `key` if its target is still alive.
    pub fn lookup_alive(
        &self,
        key: &K,
    ) -> Option<Arc<V>> {
        self.handles.get(key).and_then(Weak::upgrade)
    }

    /// Point the handle for `key` at `value`, discarding any previous handle.
    pub fn insert_or_replace(
        &mut self,
        key: K,
        value: &Arc<V>,
    ) {
        self.handles.insert(key, Arc::downgrade(value));
    }

    /// Drop every handle whose target has been reclaimed. Returns how many were dropped.
    pub fn sweep(&mut self) -> usize {
        let before = self.handles.len();
        self.handles.retain(|_, handle| handle.strong_count() > 0);
        before - self.handles.len()
    }

    /// Number of handles, dead or alive.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
