//! Keyed async mutexes: one lock per (participant, session) pair.
//!
//! The engine's read-modify-write of an attendance record must not
//! interleave with another presentation for the same pair, or two
//! concurrent check-ins could both see "no record" and both succeed.
//! Different pairs never contend.
//!
//! Slots are created on demand and removed when the last holder or waiter
//! lets go, so the map only ever holds keys that are in use right now.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One key's mutex plus how many callers hold or await it.
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    users: usize,
}

/// An arena of async mutexes addressed by key.
pub(crate) struct KeyedLocks<K> {
    // A std mutex is fine here: it is never held across an `.await`.
    slots: Mutex<HashMap<K, Slot>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until `key` is free and returns a guard holding it.
    ///
    /// Dropping the returned future while it waits releases the slot too.
    pub(crate) async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        let mutex = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                mutex: Arc::default(),
                users: 0,
            });
            slot.users += 1;
            Arc::clone(&slot.mutex)
        };
        // Registered before the first await, so cancellation runs `Drop`.
        let mut held = KeyedGuard {
            locks: self,
            key,
            guard: None,
        };
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    /// Number of keys currently locked or waited on.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Holds one key's lock (or a place in its queue); releases it and
/// reclaims the slot on drop.
pub(crate) struct KeyedGuard<'a, K: Eq + Hash + Clone> {
    locks: &'a KeyedLocks<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut slots = self.locks.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = match slots.get_mut(&self.key) {
            Some(slot) => {
                slot.users -= 1;
                slot.users == 0
            }
            None => false,
        };
        if idle {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::FutureExt;

    use super::*;

    #[tokio::test]
    async fn test_lock_releases_slot_on_drop() {
        let locks = KeyedLocks::new();

        {
            let _guard = locks.lock("a").await;
            assert_eq!(locks.len(), 1);
        }

        assert_eq!(locks.len(), 0, "idle slot should be reclaimed");
    }

    #[tokio::test]
    async fn test_lock_cancelled_while_waiting_releases_slot() {
        let locks = KeyedLocks::new();
        let holder = locks.lock("a").await;

        let mut waiter = Box::pin(locks.lock("a"));
        assert!(waiter.as_mut().now_or_never().is_none(), "key is held");
        assert_eq!(locks.len(), 1);

        drop(holder);
        drop(waiter);

        assert_eq!(locks.len(), 0, "cancelled waiter should not pin the slot");
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block_each_other() {
        let locks = KeyedLocks::new();

        let _a = locks.lock("a").await;
        // Would hang if "b" shared a's mutex.
        let b = tokio::time::timeout(Duration::from_secs(1), locks.lock("b")).await;

        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_is_mutually_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                tokio::spawn(async move {
                    let _guard = locks.lock("shared").await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.len(), 0);
    }
}
