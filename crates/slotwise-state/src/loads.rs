//! Supersession of in-flight mesh loads.
//!
//! Every load is tagged with a ticket. Issuing a new ticket for the same key
//! makes all older tickets for that key stale, so a completion arriving after
//! the user changed the selection again is ignored (last writer wins).
//! Tickets carry their key's counter, so a loader can check staleness without
//! access to the state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::model::SlotId;

/// What a load is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoadKey {
    /// The selected object of a slot.
    Slot(SlotId),
    /// The environment asset.
    Environment,
}

/// Proof of a load attempt; current until a newer attempt for the same key.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    key: LoadKey,
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl LoadTicket {
    /// The key this ticket was issued for.
    pub fn key(&self) -> &LoadKey {
        &self.key
    }

    /// Generation number within the key.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no newer load for the same key was issued since.
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.generation
    }
}

/// Per-key generation counters.
#[derive(Debug, Default)]
pub struct LoadTokens {
    generations: HashMap<LoadKey, Arc<AtomicU64>>,
}

impl LoadTokens {
    /// Create an empty set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load for `key`, invalidating earlier tickets for it.
    pub fn issue(&mut self, key: LoadKey) -> LoadTicket {
        let latest = Arc::clone(self.generations.entry(key.clone()).or_default());
        let generation = latest.fetch_add(1, Ordering::AcqRel) + 1;
        LoadTicket {
            key,
            generation,
            latest,
        }
    }

    /// Invalidate outstanding tickets for `key` without starting a load.
    pub fn invalidate(&mut self, key: &LoadKey) {
        if let Some(latest) = self.generations.get(key) {
            latest.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Invalidate and drop the counter for `key`, e.g. when its slot is removed.
    pub fn forget(&mut self, key: &LoadKey) {
        if let Some(latest) = self.generations.remove(key) {
            latest.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Invalidate every slot load, keeping the environment's.
    pub fn forget_slots(&mut self) {
        self.generations.retain(|key, latest| {
            let keep = matches!(key, LoadKey::Environment);
            if !keep {
                latest.fetch_add(1, Ordering::AcqRel);
            }
            keep
        });
    }

    /// Invalidate everything.
    pub fn clear(&mut self) {
        for latest in self.generations.values() {
            latest.fetch_add(1, Ordering::AcqRel);
        }
        self.generations.clear();
    }
}
