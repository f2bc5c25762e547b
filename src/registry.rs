use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::Instant,
};

use tracing::debug;

use crate::{CacheConfig, IdentityCache, ShareLock, model::Cacheable, utils::time::Clock};

/// Type-erased view of an [`IdentityCache`], used for registry-wide operations.
trait ErasedCache: Send + Sync {
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn tag(&self) -> &'static str;

    fn maybe_sweep(
        &self,
        now: Instant,
    ) -> bool;
}

impl<T: Cacheable> ErasedCache for IdentityCache<T> {
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn tag(&self) -> &'static str {
        IdentityCache::tag(self)
    }

    fn maybe_sweep(
        &self,
        now: Instant,
    ) -> bool {
        IdentityCache::maybe_sweep(self, now)
    }
}

/// Per-type identity caches, created lazily on first use.
///
/// Every cached type gets exactly one [`IdentityCache`] per registry, so the
/// registry is the unit of lifecycle: drop it or call
/// [`CacheRegistry::reset`] to start from an empty state.
pub struct CacheRegistry {
    caches: ShareLock<HashMap<TypeId, Arc<dyn ErasedCache>>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl CacheRegistry {
    pub(crate) fn new(
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            caches: Arc::new(RwLock::new(HashMap::new())),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The identity cache for `T`, constructing it on first use.
    pub fn cache<T: Cacheable>(&self) -> Arc<IdentityCache<T>> {
        let type_id = TypeId::of::<T>();

        let existing = self.caches.read().unwrap_or_else(PoisonError::into_inner).get(&type_id).cloned();
        let erased = match existing {
            Some(erased) => erased,
            None => {
                let mut caches = self.caches.write().unwrap_or_else(PoisonError::into_inner);
                caches
                    .entry(type_id)
                    .or_insert_with(|| {
                        debug!(tag = T::TAG, "creating identity cache");
                        Arc::new(IdentityCache::<T>::new(&self.config, self.clock.clone()))
                    })
                    .clone()
            }
        };

        erased.as_any().downcast::<IdentityCache<T>>().unwrap_or_else(|_| unreachable!("caches are keyed by their own TypeId"))
    }

    /// Give every type cache a chance to sweep. Returns how many actually swept.
    pub fn sweep_all(
        &self,
        now: Instant,
    ) -> usize {
        let caches: Vec<_> = self.caches.read().unwrap_or_else(PoisonError::into_inner).values().cloned().collect();
        caches.iter().filter(|cache| cache.maybe_sweep(now)).count()
    }

    /// Tags of the types that currently have a cache.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.caches.read().unwrap_or_else(PoisonError::into_inner).values().map(|cache| cache.tag()).collect();
        tags.sort_unstable();
        tags
    }

    /// Drop every type cache. Instances already handed out stay valid but
    /// are no longer tracked.
    pub fn reset(&self) {
        self.caches.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.caches.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{CacheRegistryBuilder, IdCacheError, Identifier, Mergeable, Slot, utils::time::ManualClock};

    #[derive(Debug)]
    struct Zip(Slot<String>);

    impl Mergeable for Zip {
        fn merge(
            &self,
            fresh: Self,
        ) {
            self.0.merge(fresh.0);
        }
    }

    impl Cacheable for Zip {
        const TAG: &'static str = "zip";
    }

    #[derive(Debug)]
    struct Phone(Slot<String>);

    impl Mergeable for Phone {
        fn merge(
            &self,
            fresh: Self,
        ) {
            self.0.merge(fresh.0);
        }
    }

    impl Cacheable for Phone {
        const TAG: &'static str = "phone";
    }

    fn create_test_registry() -> (CacheRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let registry = CacheRegistryBuilder::new().clock(clock.clone()).build().unwrap();
        (registry, clock)
    }

    #[test]
    fn test_cache_is_created_once_per_type() {
        let (registry, _) = create_test_registry();
        assert!(registry.is_empty());

        let first = registry.cache::<Zip>();
        let second = registry.cache::<Zip>();
        assert!(Arc::ptr_eq(&first, &second));

        registry.cache::<Phone>();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tags(), vec!["phone", "zip"]);
    }

    #[test]
    fn test_types_do_not_share_entries() {
        let (registry, _) = create_test_registry();

        let zip = registry
            .cache::<Zip>()
            .get(7, 60, Some(|_: &Identifier| Ok::<_, IdCacheError>(Zip(Slot::new("02139".into())))))
            .unwrap()
            .unwrap();
        assert_eq!(zip.0.get(), "02139");

        assert!(registry.cache::<Phone>().get_loaded(7, 60).is_none());
    }

    #[test]
    fn test_reset_starts_from_scratch() {
        let (registry, _) = create_test_registry();
        let before = registry.cache::<Zip>();
        before.get(1, 60, Some(|_: &Identifier| Ok::<_, IdCacheError>(Zip(Slot::new("a".into()))))).unwrap();

        registry.reset();
        assert!(registry.is_empty());

        let after = registry.cache::<Zip>();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.get_loaded(1, 60).is_none());
    }

    #[test]
    fn test_sweep_all_is_throttled_per_type() {
        let (registry, clock) = create_test_registry();
        registry.cache::<Zip>();
        registry.cache::<Phone>();

        assert_eq!(registry.sweep_all(clock.now()), 2);
        assert_eq!(registry.sweep_all(clock.now() + Duration::from_secs(30)), 0);
        assert_eq!(registry.sweep_all(clock.now() + Duration::from_secs(120)), 2);
    }
}
