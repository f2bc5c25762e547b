use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time counters of an [`IdentityCache`](crate::IdentityCache).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered by the hard cache.
    pub hits: u64,
    /// Lookups that fell through the hard cache.
    pub misses: u64,
    /// Successful loader invocations.
    pub loads: u64,
    /// Fresh values adopted as a new instance.
    pub adoptions: u64,
    /// Fresh values merged into a live instance, including pushed updates.
    pub merges: u64,
    /// Registry sweeps that actually ran.
    pub sweeps: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounter {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    adoptions: AtomicU64,
    merges: AtomicU64,
    sweeps: AtomicU64,
}

impl StatsCounter {
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn adoption(&self) {
        self.adoptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn merge(&self) {
        self.merges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sweep(&self) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            adoptions: self.adoptions.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
        }
    }
}
