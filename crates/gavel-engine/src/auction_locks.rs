//! Keyed per-auction locks.
//!
//! Correctness of bid placement rests on per-auction serialization, not
//! timing. Every mutator of one auction — coordinator, scheduler,
//! settlement — acquires the same keyed lock, so same-auction operations
//! are strictly ordered while different auctions proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gavel_types::AuctionId;

/// Registry of one mutex per auction, created on first use.
///
/// Lock entries are never removed: an auction's lock lives as long as
/// the registry, matching the store's retain-forever policy.
///
/// Usage: clone the entry out, then lock it.
///
/// ```
/// # use gavel_engine::KeyedLocks;
/// # use gavel_types::AuctionId;
/// let locks = KeyedLocks::new();
/// let entry = locks.entry(AuctionId::new());
/// let _guard = entry.lock().expect("auction lock poisoned");
/// // ... critical section ...
/// ```
pub struct KeyedLocks {
    locks: Mutex<HashMap<AuctionId, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The lock for one auction. Callers hold the lock for the duration
    /// of their critical section.
    #[must_use]
    pub fn entry(&self, id: AuctionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("keyed lock registry poisoned");
        Arc::clone(locks.entry(id).or_default())
    }

    /// Number of auctions that have ever been locked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().expect("keyed lock registry poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KeyedLocks {
    fn default() -> Self {
        Self::new()
    }
}
