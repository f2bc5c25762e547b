use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use super::Mergeable;

/// A value behind a lock, merged by whole-value replacement.
///
/// Useful for cached types whose fields are plain data: wrap them in a
/// `Slot` and every holder of the shared instance sees the refreshed value
/// after a merge.
#[derive(Debug, Default)]
pub struct Slot<V> {
    inner: RwLock<V>,
}

impl<V> Slot<V> {
    pub fn new(value: V) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, V> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut V) -> R,
    ) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn into_inner(self) -> V {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone> Slot<V> {
    pub fn get(&self) -> V {
        self.read().clone()
    }
}

impl<V> Mergeable for Slot<V>
where
    V: Send + Sync,
{
    fn merge(
        &self,
        fresh: Self,
    ) {
        let value = fresh.into_inner();
        self.update(|current| *current = value);
    }
}
