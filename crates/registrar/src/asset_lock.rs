//! Per-parent-asset mutual exclusion
//!
//! Two registrations against the same parent asset must not race each
//! other between a discovery tick and a manual run. Locks expire after a
//! timeout so a task that died mid-transaction cannot wedge the parent
//! forever.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use story::Address;
use tracing::debug;

/// Guard that releases the parent-asset lock when dropped
pub struct AssetLockGuard {
    manager: AssetLockManager,
    asset: Address,
    taken_at: Instant,
}

impl Drop for AssetLockGuard {
    fn drop(&mut self) {
        self.manager.release(self.asset, self.taken_at);
        debug!("Released lock for parent asset {}", self.asset);
    }
}

/// Lock manager keyed by parent asset address
#[derive(Clone)]
pub struct AssetLockManager {
    locks: Arc<Mutex<HashMap<Address, Instant>>>,
    lock_timeout: Duration,
}

impl AssetLockManager {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
            lock_timeout,
        }
    }

    /// Attempt to lock a parent asset for exclusive registration.
    /// Returns `None` when another registration holds the lock.
    pub fn try_lock(&self, asset: Address) -> Option<AssetLockGuard> {
        let mut locks = self.locks.lock();
        let now = Instant::now();

        // Expired locks belong to tasks that never released them
        locks.retain(|addr, taken_at| {
            let keep = now.duration_since(*taken_at) < self.lock_timeout;
            if !keep {
                debug!("Removing expired lock for parent asset {}", addr);
            }
            keep
        });

        use std::collections::hash_map::Entry;
        match locks.entry(asset) {
            Entry::Occupied(entry) => {
                debug!(
                    "Parent asset {} already locked ({:?} ago)",
                    asset,
                    now.duration_since(*entry.get())
                );
                None
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                debug!("Acquired lock for parent asset {}", asset);
                Some(AssetLockGuard {
                    manager: self.clone(),
                    asset,
                    taken_at: now,
                })
            }
        }
    }

    pub fn is_locked(&self, asset: Address) -> bool {
        let mut locks = self.locks.lock();
        let now = Instant::now();
        locks.retain(|_, taken_at| now.duration_since(*taken_at) < self.lock_timeout);
        locks.contains_key(&asset)
    }

    /// Remove the entry only when it is still the one this guard took.
    /// An expired lock may have been re-acquired by another task; its
    /// entry must survive the stale guard's drop.
    fn release(&self, asset: Address, taken_at: Instant) {
        let mut locks = self.locks.lock();
        if locks.get(&asset) == Some(&taken_at) {
            locks.remove(&asset);
        }
    }
}
