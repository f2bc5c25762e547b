use std::{
    hash::Hash,
    time::{Duration, Instant},
};

use tracing::debug;

use crate::common::WeakRegistry;

/// Throttles registry sweeps to at most one per interval.
///
/// There is no background timer: whichever caller trips the interval pays
/// for the sweep.
#[derive(Debug)]
pub struct SweepScheduler {
    interval: Duration,
    last_sweep: Option<Instant>,
}

impl SweepScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sweep: None,
        }
    }

    /// Sweep `registry` unless the last sweep happened less than one interval before `now`.
    ///
    /// Returns whether a sweep ran.
    pub fn maybe_sweep<K, V>(
        &mut self,
        now: Instant,
        registry: &mut WeakRegistry<K, V>,
    ) -> bool
    where
        K: Eq + Hash,
    {
        if let Some(last) = self.last_sweep
            && now.saturating_duration_since(last) < self.interval
        {
            return false;
        }

        self.last_sweep = Some(now);
        let removed = registry.sweep();
        debug!(removed, remaining = registry.len(), "swept weak registry");
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_first_call_sweeps() {
        let mut scheduler = SweepScheduler::new(Duration::from_secs(120));
        let mut registry: WeakRegistry<&str, i32> = WeakRegistry::new();
        assert!(scheduler.maybe_sweep(Instant::now(), &mut registry));
    }

    #[test]
    fn test_throttled_within_interval() {
        let mut scheduler = SweepScheduler::new(Duration::from_secs(120));
        let mut registry = WeakRegistry::new();
        let start = Instant::now();

        assert!(scheduler.maybe_sweep(start, &mut registry));

        let dead = Arc::new(1);
        registry.insert_or_replace("dead", &dead);
        drop(dead);

        assert!(!scheduler.maybe_sweep(start + Duration::from_secs(119), &mut registry));
        assert_eq!(registry.len(), 1);

        assert!(scheduler.maybe_sweep(start + Duration::from_secs(120), &mut registry));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clock_going_backwards_does_not_sweep() {
        let mut scheduler = SweepScheduler::new(Duration::from_secs(60));
        let mut registry: WeakRegistry<&str, i32> = WeakRegistry::new();
        let start = Instant::now() + Duration::from_secs(10);

        assert!(scheduler.maybe_sweep(start, &mut registry));
        assert!(!scheduler.maybe_sweep(start - Duration::from_secs(5), &mut registry));
    }
}
