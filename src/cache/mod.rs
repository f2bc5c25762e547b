//! Identity cache - a decaying hard cache over a weak identity registry.
//!
//! Every type gets its own [`IdentityCache`]. A lookup is answered by the
//! hard cache while its entry is fresh; after that the loader runs again and
//! its output is merged into whatever instance is still alive, so callers
//! holding the old `Arc<T>` see the refreshed data instead of a second copy.

mod gate;
mod stats;
mod sweep;

use std::{
    convert::Infallible,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use tracing::{debug, trace};

use crate::{
    CacheConfig,
    common::{DecayStore, WeakRegistry},
    model::{CacheKey, Cacheable, Identifier},
    utils::time::Clock,
};

use gate::LoadGates;
use stats::StatsCounter;

pub use stats::CacheStats;
pub use sweep::SweepScheduler;

/// Bookkeeping guarded by the type lock.
struct CacheState<T> {
    registry: WeakRegistry<CacheKey, T>,
    sweeper: SweepScheduler,
}

/// Identity-preserving cache for one cached type.
///
/// All synchronous operations on a type are serialized behind a single
/// lock, loader calls included. Two `get`s for different keys of the same
/// type therefore never run their loaders in parallel, and a loader must not
/// call back into the cache of its own type.
///
/// # Example
///
/// ```rust,ignore
/// let customers = registry.cache::<Customer>();
/// let customer = customers.get(42, 60, Some(|id: &Identifier| repo.load_customer(id)))?;
/// ```
pub struct IdentityCache<T: Cacheable> {
    /// Hard tier, holds strong references until expiry.
    hard: DecayStore<CacheKey, Arc<T>>,
    /// The type lock.
    state: Mutex<CacheState<T>>,
    /// In-flight async loads, keyed by cache key.
    gates: LoadGates,

    clock: Arc<dyn Clock>,
    update_ttl_secs: u32,
    stats: StatsCounter,
}

impl<T: Cacheable> IdentityCache<T> {
    pub fn new(
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            hard: DecayStore::new(config.capacity, clock.clone()),
            state: Mutex::new(CacheState {
                registry: WeakRegistry::new(),
                sweeper: SweepScheduler::new(config.sweep_interval()),
            }),
            gates: LoadGates::default(),
            clock,
            update_ttl_secs: config.update_ttl_secs,
            stats: StatsCounter::default(),
        }
    }

    /// Logical type tag of this cache.
    pub fn tag(&self) -> &'static str {
        T::TAG
    }

    /// Get the instance for `id`, loading it on a hard-cache miss.
    ///
    /// - A fresh hard-cache entry is returned without calling `loader`.
    /// - On a miss `loader` always runs. Its output is merged into the live
    ///   instance for `id` if one exists, otherwise it becomes the instance.
    /// - Without a loader only a live instance can be returned.
    ///
    /// Either way the returned instance is re-armed in the hard cache for
    /// `ttl_secs`. Invalid ids yield `Ok(None)` without touching the cache.
    /// Loader errors are returned unchanged and leave the cache untouched.
    pub fn get<F, E>(
        &self,
        id: impl Into<Identifier>,
        ttl_secs: u32,
        loader: Option<F>,
    ) -> Result<Option<Arc<T>>, E>
    where
        F: FnOnce(&Identifier) -> Result<T, E>,
    {
        let id = id.into();
        if !id.is_valid() {
            trace!("idcache::get({}, {}) invalid id", T::TAG, id);
            return Ok(None);
        }
        let key = T::key(&id);

        let mut state = self.lock();
        self.sweep_locked(&mut state, self.clock.now());
        self.resolve_locked(&mut state, &key, &id, ttl_secs, loader)
    }

    /// Get the instance for `id` if it is cached or still alive, never loading.
    pub fn get_loaded(
        &self,
        id: impl Into<Identifier>,
        ttl_secs: u32,
    ) -> Option<Arc<T>> {
        match self.get(id, ttl_secs, None::<fn(&Identifier) -> Result<T, Infallible>>) {
            Ok(found) => found,
            Err(never) => match never {},
        }
    }

    /// Async counterpart of [`IdentityCache::get`].
    ///
    /// The type lock is never held across the loader's await point.
    /// Concurrent calls for the same key wait for the first load and then
    /// find its result in the hard cache; calls for other keys load in
    /// parallel.
    pub async fn get_async<F, Fut, E>(
        &self,
        id: impl Into<Identifier>,
        ttl_secs: u32,
        loader: F,
    ) -> Result<Option<Arc<T>>, E>
    where
        F: FnOnce(Identifier) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let id = id.into();
        if !id.is_valid() {
            trace!("idcache::get_async({}, {}) invalid id", T::TAG, id);
            return Ok(None);
        }
        let key = T::key(&id);

        if let Some(hit) = self.probe(&key) {
            return Ok(Some(hit));
        }

        let ticket = self.gates.enter(&key);
        let _permit = ticket.lock().await;
        if let Some(hit) = self.probe(&key) {
            return Ok(Some(hit));
        }

        self.stats.miss();
        trace!("idcache::get_async({}) loading", key);
        let fresh = loader(id).await?;
        self.stats.load();

        let mut state = self.lock();
        let alive = state.registry.lookup_alive(&key);
        let record = self.install_locked(&mut state, &key, alive, fresh);
        self.hard.set(key, record.clone(), ttl_secs);
        Ok(Some(record))
    }

    /// Merge `new_values` into the instance for `id`, if one is loaded.
    ///
    /// Nothing is loaded to apply an update: with no cached or live instance
    /// this is a no-op. Returns whether the update was applied.
    pub fn push_update(
        &self,
        id: impl Into<Identifier>,
        new_values: T,
    ) -> bool {
        let id = id.into();
        if !id.is_valid() {
            return false;
        }
        let key = T::key(&id);

        let mut state = self.lock();
        let current = match self.resolve_locked(
            &mut state,
            &key,
            &id,
            self.update_ttl_secs,
            None::<fn(&Identifier) -> Result<T, Infallible>>,
        ) {
            Ok(current) => current,
            Err(never) => match never {},
        };

        match current {
            Some(current) => {
                current.merge(new_values);
                self.stats.merge();
                debug!(key = %key, "pushed update into live instance");
                true
            }
            None => {
                trace!("idcache::push_update({}) nothing loaded", key);
                false
            }
        }
    }

    /// Evict `id` from the hard cache. Live instances stay registered.
    pub fn remove(
        &self,
        id: impl Into<Identifier>,
    ) {
        let id = id.into();
        if !id.is_valid() {
            return;
        }
        let key = T::key(&id);

        let _state = self.lock();
        self.hard.remove(&key);
        trace!("idcache::remove({})", key);
    }

    /// Sweep dead registry handles unless a sweep ran within the configured interval.
    pub fn maybe_sweep(
        &self,
        now: Instant,
    ) -> bool {
        let mut state = self.lock();
        self.sweep_locked(&mut state, now)
    }

    /// Number of registry handles, including dead ones not yet swept.
    pub fn handle_count(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        // a panicking loader commits nothing, so the state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn probe(
        &self,
        key: &CacheKey,
    ) -> Option<Arc<T>> {
        let mut state = self.lock();
        self.sweep_locked(&mut state, self.clock.now());
        let hit = self.hard.get(key)?;
        self.stats.hit();
        trace!("idcache::probe({}) hit", key);
        Some(hit)
    }

    fn sweep_locked(
        &self,
        state: &mut CacheState<T>,
        now: Instant,
    ) -> bool {
        let CacheState { registry, sweeper } = state;
        let swept = sweeper.maybe_sweep(now, registry);
        if swept {
            self.stats.sweep();
        }
        swept
    }

    fn resolve_locked<F, E>(
        &self,
        state: &mut CacheState<T>,
        key: &CacheKey,
        id: &Identifier,
        ttl_secs: u32,
        loader: Option<F>,
    ) -> Result<Option<Arc<T>>, E>
    where
        F: FnOnce(&Identifier) -> Result<T, E>,
    {
        if let Some(hit) = self.hard.get(key) {
            self.stats.hit();
            trace!("idcache::get({}) hit", key);
            return Ok(Some(hit));
        }
        self.stats.miss();

        let alive = state.registry.lookup_alive(key);
        let record = match loader {
            Some(loader) => {
                trace!("idcache::get({}) loading", key);
                let fresh = loader(id)?;
                self.stats.load();
                Some(self.install_locked(state, key, alive, fresh))
            }
            None => alive,
        };

        if let Some(record) = &record {
            self.hard.set(key.clone(), record.clone(), ttl_secs);
        }
        Ok(record)
    }

    /// Make `fresh` current for `key`: merge into `alive` or adopt as a new instance.
    fn install_locked(
        &self,
        state: &mut CacheState<T>,
        key: &CacheKey,
        alive: Option<Arc<T>>,
        fresh: T,
    ) -> Arc<T> {
        match alive {
            Some(current) => {
                current.merge(fresh);
                self.stats.merge();
                debug!(key = %key, "merged fresh load into live instance");
                current
            }
            None => {
                let record = Arc::new(fresh);
                state.registry.insert_or_replace(key.clone(), &record);
                self.stats.adoption();
                debug!(key = %key, "adopted fresh load");
                record
            }
        }
    }
}
