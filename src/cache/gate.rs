//! Per-key gates that coalesce concurrent async loads.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::model::CacheKey;

#[derive(Debug, Default)]
pub(crate) struct LoadGates {
    gates: Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>,
}

impl LoadGates {
    /// Join the gate for `key`, creating it if no load is in flight.
    pub fn enter(
        &self,
        key: &CacheKey,
    ) -> GateTicket<'_> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        let gate = gates.entry(key.clone()).or_default().clone();
        GateTicket {
            gates: self,
            key: key.clone(),
            gate,
        }
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn leave(
        &self,
        key: &CacheKey,
        gate: &Arc<AsyncMutex<()>>,
    ) {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        // the map and this ticket are the only holders left
        if Arc::strong_count(gate) == 2 {
            gates.remove(key);
        }
    }
}

/// Membership in a key's gate; the gate entry is dropped with its last ticket.
pub(crate) struct GateTicket<'a> {
    gates: &'a LoadGates,
    key: CacheKey,
    gate: Arc<AsyncMutex<()>>,
}

impl GateTicket<'_> {
    pub async fn lock(&self) -> OwnedMutexGuard<()> {
        self.gate.clone().lock_owned().await
    }
}

impl Drop for GateTicket<'_> {
    fn drop(&mut self) {
        self.gates.leave(&self.key, &self.gate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Identifier;

    #[tokio::test]
    async fn test_gate_removed_after_last_ticket() {
        let gates = LoadGates::default();
        let key = CacheKey::new("t", &Identifier::from(1));

        let first = gates.enter(&key);
        let second = gates.enter(&key);
        assert_eq!(gates.in_flight(), 1);

        {
            let _permit = first.lock().await;
        }
        drop(first);
        assert_eq!(gates.in_flight(), 1);

        drop(second);
        assert_eq!(gates.in_flight(), 0);
    }
}
