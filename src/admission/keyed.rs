//! # Keyed, non-blocking semaphore.
//!
//! [`KeyedSemaphore`] is a capacity-N gate partitioned by a caller-supplied
//! string key. Every key gets its own bounded counter, created lazily on first use.
//!
//! ## Rules
//! - `try_acquire` never waits: it occupies a slot or returns `false` immediately.
//! - `release` never waits and never fails: releasing an unknown key, or releasing
//!   more times than acquired, is a no-op.
//! - Capacity 0 never admits.
//! - Keys are independent: a saturated key does not affect any other key.
//! - A key whose last slot is released is evicted, so the table only holds busy keys.
//!
//! ## Internal scheme
//! ```text
//! slots: DashMap<String, AtomicUsize>   (sharded; one counter per key)
//!
//! try_acquire(key):
//!   ├─ capacity == 0            → false
//!   ├─ get(key)   (shard read)  → CAS held: n < capacity ? n+1 : deny
//!   └─ entry(key) (shard write) → create counter once, then CAS as above
//!
//! release(key):
//!   ├─ get(key)   (shard read)  → CAS held: n > 0 ? n-1 : leave at 0
//!   └─ reached 0  (shard write) → remove_if(held == 0)
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

/// Bounded, non-blocking, key-partitioned admission gate.
#[derive(Debug)]
pub struct KeyedSemaphore {
    capacity: usize,
    slots: DashMap<String, AtomicUsize>,
}

impl KeyedSemaphore {
    /// Creates a gate admitting at most `capacity` holders per key.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: DashMap::new(),
        }
    }

    /// Returns the per-key capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tries to occupy one slot for `key`.
    ///
    /// Returns `true` if fewer than `capacity` slots were held for `key`,
    /// `false` otherwise. Never blocks.
    pub fn try_acquire(&self, key: &str) -> bool {
        if self.capacity == 0 {
            return false;
        }

        if let Some(held) = self.slots.get(key) {
            return occupy(&held, self.capacity);
        }

        let held = self
            .slots
            .entry(key.to_owned())
            .or_insert_with(|| AtomicUsize::new(0));
        occupy(&held, self.capacity)
    }

    /// Frees one held slot for `key`, if any is held.
    ///
    /// Unknown keys and over-release are tolerated.
    pub fn release(&self, key: &str) {
        let now_idle = match self.slots.get(key) {
            Some(held) => {
                held.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                    == Ok(1)
            }
            None => false,
        };

        // The read guard must be gone before taking the shard write lock.
        if now_idle {
            self.slots
                .remove_if(key, |_, held| held.load(Ordering::Acquire) == 0);
        }
    }

    /// Returns the number of slots currently held for `key`.
    pub fn held(&self, key: &str) -> usize {
        self.slots
            .get(key)
            .map_or(0, |held| held.load(Ordering::Acquire))
    }

    /// Returns the number of slots currently held across all keys.
    pub fn total_held(&self) -> usize {
        self.slots
            .iter()
            .map(|entry| entry.value().load(Ordering::Acquire))
            .sum()
    }

    /// Returns how many keys currently hold at least one slot.
    ///
    /// A key that was just created by a losing `try_acquire` may be counted
    /// until its next release.
    pub fn key_count(&self) -> usize {
        self.slots.len()
    }
}

fn occupy(held: &AtomicUsize, capacity: usize) -> bool {
    held.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
        (n < capacity).then_some(n + 1)
    })
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn admits_up_to_capacity_per_key() {
        let sem = KeyedSemaphore::new(2);

        assert!(sem.try_acquire("a"));
        assert!(sem.try_acquire("a"));
        assert!(!sem.try_acquire("a"));
        assert_eq!(sem.held("a"), 2);

        sem.release("a");
        assert!(sem.try_acquire("a"));
    }

    #[test]
    fn keys_are_independent() {
        let sem = KeyedSemaphore::new(1);

        assert!(sem.try_acquire("u1"));
        assert!(!sem.try_acquire("u1"));
        assert!(sem.try_acquire("u2"));
        assert_eq!(sem.total_held(), 2);
        assert_eq!(sem.key_count(), 2);
    }

    #[test]
    fn zero_capacity_never_admits() {
        let sem = KeyedSemaphore::new(0);
        for key in ["", "a", "b"] {
            assert!(!sem.try_acquire(key));
        }
        assert_eq!(sem.total_held(), 0);
    }

    #[test]
    fn release_tolerates_unknown_key_and_over_release() {
        let sem = KeyedSemaphore::new(1);

        sem.release("never-acquired");
        assert_eq!(sem.held("never-acquired"), 0);

        assert!(sem.try_acquire("k"));
        sem.release("k");
        sem.release("k");
        sem.release("k");
        assert_eq!(sem.held("k"), 0);

        // Over-release must not have banked extra capacity.
        assert!(sem.try_acquire("k"));
        assert!(!sem.try_acquire("k"));
    }

    #[test]
    fn idle_keys_are_evicted() {
        let sem = KeyedSemaphore::new(2);
        for i in 0..1_000 {
            let key = format!("tenant-{i}");
            assert!(sem.try_acquire(&key));
            sem.release(&key);
        }
        assert_eq!(sem.key_count(), 0);

        assert!(sem.try_acquire("busy"));
        assert!(sem.try_acquire("busy"));
        sem.release("busy");
        assert_eq!(sem.key_count(), 1);
        sem.release("busy");
        assert_eq!(sem.key_count(), 0);

        // Re-created on next use with a fresh count.
        assert!(sem.try_acquire("busy"));
        assert!(sem.try_acquire("busy"));
        assert!(!sem.try_acquire("busy"));
    }

    #[test]
    fn concurrent_holders_never_exceed_capacity() {
        const CAPACITY: usize = 3;
        let sem = Arc::new(KeyedSemaphore::new(CAPACITY));
        let current = Arc::new(AtomicUsize::new(0));
        let exceeded = Arc::new(AtomicBool::new(false));

        std::thread::scope(|s| {
            for _ in 0..16 {
                let sem = Arc::clone(&sem);
                let current = Arc::clone(&current);
                let exceeded = Arc::clone(&exceeded);
                s.spawn(move || {
                    for _ in 0..2_000 {
                        if sem.try_acquire("shared") {
                            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                            if now > CAPACITY {
                                exceeded.store(true, Ordering::SeqCst);
                            }
                            std::hint::spin_loop();
                            current.fetch_sub(1, Ordering::SeqCst);
                            sem.release("shared");
                        }
                    }
                });
            }
        });

        assert!(!exceeded.load(Ordering::SeqCst));
        assert_eq!(sem.held("shared"), 0);
        assert_eq!(sem.key_count(), 0);
    }

    #[test]
    fn concurrent_first_use_creates_one_counter() {
        let sem = Arc::new(KeyedSemaphore::new(1));
        let admitted = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|s| {
            for _ in 0..8 {
                let sem = Arc::clone(&sem);
                let admitted = Arc::clone(&admitted);
                s.spawn(move || {
                    if sem.try_acquire("fresh") {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
        assert_eq!(sem.key_count(), 1);
    }
}
