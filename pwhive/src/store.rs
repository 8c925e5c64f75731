//! Uniqueness stores: the sets that remember every accepted password.
//!
//! Both implementations make `check_and_insert` a single step under a lock, so
//! when several producers race on the same candidate exactly one of them sees
//! `Ok(true)`.

use std::collections::HashSet;
use std::hash::{BuildHasher, RandomState};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use compact_str::CompactString;

use crate::error::StoreError;

/// Number of independently locked shards in a [`HashStore`].
pub const SHARDS: usize = 64;

/// A set of previously accepted strings.
pub trait UniquenessStore: Send + Sync {
    /// Inserts `candidate` if it is not present.
    ///
    /// Returns `Ok(true)` if this call inserted it, `Ok(false)` if it was
    /// already stored. Errors leave previously stored entries untouched.
    fn check_and_insert(&self, candidate: &str) -> Result<bool, StoreError>;

    /// Number of distinct entries currently stored.
    fn count(&self) -> usize;

    /// Releases the store's memory and returns how many entries it held.
    ///
    /// Consuming `self` means a destroyed store cannot be used again.
    fn destroy(self) -> usize
    where
        Self: Sized,
    {
        let n = self.count();
        drop(self);
        n
    }
}

/// Sharded hash set. Expected O(len) per operation (one hash, one probe).
///
/// Memory grows linearly with the number of entries; each shard doubles its
/// table independently, so growth pauses are spread out. Strings of up to 24
/// bytes are stored inline by `CompactString` without a separate allocation.
#[derive(Debug)]
pub struct HashStore {
    shards: Box<[Mutex<HashSet<CompactString>>]>,
    hasher: RandomState,
    len: AtomicUsize,
}

impl HashStore {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-sizes the shards to hold about `entries` strings in total.
    pub fn with_capacity(entries: usize) -> Self {
        let per_shard = entries.div_ceil(SHARDS);
        let shards = (0..SHARDS).map(|_| Mutex::new(HashSet::with_capacity(per_shard))).collect();
        Self { shards, hasher: RandomState::new(), len: AtomicUsize::new(0) }
    }

    #[inline]
    fn shard(&self, candidate: &str) -> &Mutex<HashSet<CompactString>> {
        let idx = (self.hasher.hash_one(candidate) as usize) % SHARDS;
        &self.shards[idx]
    }
}

impl Default for HashStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UniquenessStore for HashStore {
    fn check_and_insert(&self, candidate: &str) -> Result<bool, StoreError> {
        let mut set = self.shard(candidate).lock().map_err(|_| StoreError::Poisoned)?;
        if set.contains(candidate) {
            return Ok(false);
        }

        set.try_reserve(1).map_err(|_| StoreError::Exhausted { entries: self.count() + 1 })?;
        set.insert(CompactString::new(candidate));
        self.len.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    fn count(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;

    #[test]
    fn test_insert_twice() {
        let store = HashStore::new();
        assert!(store.check_and_insert("Ab3dEf9hIjKl").unwrap());
        assert!(!store.check_and_insert("Ab3dEf9hIjKl").unwrap());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_distinct_entries_counted() {
        let store = HashStore::with_capacity(1000);
        for i in 0..1000 {
            assert!(store.check_and_insert(&format!("pw{i:05}")).unwrap());
        }
        for i in 0..1000 {
            assert!(!store.check_and_insert(&format!("pw{i:05}")).unwrap());
        }
        assert_eq!(store.count(), 1000);
        assert_eq!(store.destroy(), 1000);
    }

    #[test]
    fn test_long_entries_stored() {
        let store = HashStore::new();
        let long = "x".repeat(100);
        assert!(store.check_and_insert(&long).unwrap());
        assert!(!store.check_and_insert(&long).unwrap());
        assert!(store.check_and_insert(&long[..99]).unwrap());
    }

    #[test]
    fn test_concurrent_same_candidate() {
        const WORKERS: usize = 16;
        let store = Arc::new(HashStore::new());
        let barrier = Arc::new(Barrier::new(WORKERS));

        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.check_and_insert("same-candidate").unwrap()
                })
            })
            .collect();

        let wins = handles.into_iter().map(|h| h.join().unwrap()).filter(|&won| won).count();
        assert_eq!(wins, 1);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_poisoned_shard_reported() {
        let store = Arc::new(HashStore::new());
        let victim = "poison-me";

        let s = Arc::clone(&store);
        let _ = thread::spawn(move || {
            let _guard = s.shard(victim).lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.check_and_insert(victim), Err(StoreError::Poisoned)));
        assert_eq!(store.count(), 0);
    }
}
