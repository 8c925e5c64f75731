use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use pwhive::{
    Alphabet, Error, HashStore, HiveConfig, RandomSource, Sink, SinkError, StoreError, Swarm,
    TrieStore, UniquenessStore,
};

/// Fails every `nth` emit.
struct EveryNthFails {
    nth: u64,
    calls: u64,
    out: Vec<String>,
}

impl Sink for EveryNthFails {
    fn emit(&mut self, record: &str) -> Result<(), SinkError> {
        self.calls += 1;
        if self.calls % self.nth == 0 {
            return Err(io::Error::other("transient").into());
        }
        self.out.push(record.to_owned());
        Ok(())
    }
}

/// Fails the first `failures` checks, then defers to a hash store.
struct FlakyStore {
    failures: AtomicU32,
    inner: HashStore,
}

impl FlakyStore {
    fn new(failures: u32) -> Self {
        Self { failures: AtomicU32::new(failures), inner: HashStore::new() }
    }
}

impl UniquenessStore for FlakyStore {
    fn check_and_insert(&self, password: &str) -> Result<bool, StoreError> {
        let failed = self
            .failures
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StoreError::Exhausted { entries: self.inner.count() });
        }
        self.inner.check_and_insert(password)
    }

    fn count(&self) -> usize {
        self.inner.count()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_swarm_delivers_unique_passwords() {
    let alphabet = Alphabet::default();
    let config = HiveConfig::new(10_000, 10);
    let progress = Arc::new(AtomicU64::new(0));
    let swarm = Swarm::new(config, alphabet.clone(), HashStore::with_capacity(10_000), 4)
        .unwrap()
        .with_progress(Arc::clone(&progress));
    assert_eq!(swarm.workers(), 4);

    let (summary, store, out) = swarm.run(Vec::<String>::new()).await.unwrap();
    assert_eq!(summary.generated, 10_000);
    assert_eq!(summary.errors, 0);
    assert_eq!(out.len(), 10_000);
    assert_eq!(out.iter().collect::<HashSet<_>>().len(), 10_000);
    assert!(out.iter().all(|pw| pw.chars().count() == 10));
    assert!(out.iter().all(|pw| pw.chars().all(|c| alphabet.contains(c))));
    assert_eq!(progress.load(Ordering::Relaxed), 10_000);
    // Workers only search after claiming a slot and every claimed slot is delivered.
    assert_eq!(store.count(), 10_000);
}

#[tokio::test]
async fn test_swarm_exhausts_small_space() {
    let alphabet = Alphabet::new("ab".chars()).unwrap();
    let sources = (0..3u64)
        .map(|i| RandomSource::from_seed_bytes(&i.to_le_bytes()).unwrap())
        .collect();
    let swarm =
        Swarm::with_random_sources(HiveConfig::new(8, 3), alphabet, TrieStore::new(), sources)
            .unwrap();

    let (summary, store, mut out) = swarm.run(Vec::<String>::new()).await.unwrap();
    assert_eq!(summary.generated, 8);
    assert_eq!(store.count(), 8);
    out.sort();
    assert_eq!(out, ["aaa", "aab", "aba", "abb", "baa", "bab", "bba", "bbb"]);
}

#[tokio::test]
async fn test_swarm_retries_sink_failures() {
    let sink = EveryNthFails { nth: 7, calls: 0, out: Vec::new() };
    let swarm = Swarm::new(HiveConfig::new(500, 12), Alphabet::default(), HashStore::new(), 3)
        .unwrap();

    let (summary, _, sink) = swarm.run(sink).await.unwrap();
    assert_eq!(summary.generated, 500);
    assert_eq!(sink.out.len(), 500);
    assert_eq!(sink.out.iter().collect::<HashSet<_>>().len(), 500);
    assert_eq!(summary.errors, sink.calls - 500);
    assert!(summary.errors > 0);
}

#[tokio::test]
async fn test_swarm_capacity_and_zero() {
    let alphabet = Alphabet::new("a".chars()).unwrap();
    let swarm = Swarm::new(HiveConfig::new(2, 1), alphabet.clone(), HashStore::new(), 2).unwrap();
    assert!(matches!(swarm.run(Vec::<String>::new()).await, Err(Error::Capacity { .. })));

    let swarm = Swarm::new(HiveConfig::new(0, 1), alphabet, HashStore::new(), 2).unwrap();
    let (summary, _, out) = swarm.run(Vec::<String>::new()).await.unwrap();
    assert_eq!(summary.generated, 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_swarm_sink_failure_at_capacity_completes() {
    let sink = EveryNthFails { nth: 2, calls: 0, out: Vec::new() };
    let alphabet = Alphabet::new("ab".chars()).unwrap();
    let swarm = Swarm::new(HiveConfig::new(2, 1), alphabet, HashStore::new(), 2).unwrap();

    let (summary, store, mut sink) = swarm.run(sink).await.unwrap();
    assert_eq!(summary.generated, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(store.count(), 2);
    sink.out.sort();
    assert_eq!(sink.out, ["a", "b"]);
}

#[tokio::test]
async fn test_swarm_prefilled_store_limits_capacity() {
    let alphabet = Alphabet::new("ab".chars()).unwrap();
    let store = HashStore::new();
    assert!(store.check_and_insert("a").unwrap());
    let swarm = Swarm::new(HiveConfig::new(2, 1), alphabet.clone(), store, 2).unwrap();
    let err = swarm.run(Vec::<String>::new()).await.unwrap_err();
    assert!(matches!(err, Error::Capacity { requested: 2, capacity: 1 }));

    let store = HashStore::new();
    assert!(store.check_and_insert("a").unwrap());
    let swarm = Swarm::new(HiveConfig::new(1, 1), alphabet, store, 2).unwrap();
    let (summary, store, out) = swarm.run(Vec::<String>::new()).await.unwrap();
    assert_eq!(summary.generated, 1);
    assert_eq!(store.count(), 2);
    assert_eq!(out, ["b"]);
}

#[tokio::test]
async fn test_swarm_retries_store_failures() {
    let swarm = Swarm::new(HiveConfig::new(100, 12), Alphabet::default(), FlakyStore::new(5), 2)
        .unwrap();

    let (summary, store, out) = swarm.run(Vec::<String>::new()).await.unwrap();
    assert_eq!(summary.generated, 100);
    assert_eq!(summary.errors, 5);
    assert_eq!(store.count(), 100);
    assert_eq!(out.iter().collect::<HashSet<_>>().len(), 100);
}

#[tokio::test]
async fn test_swarm_gives_up_on_broken_store() {
    let config = HiveConfig::new(10, 12).max_consecutive_errors(3);
    let swarm = Swarm::new(config, Alphabet::default(), FlakyStore::new(u32::MAX), 2).unwrap();
    assert!(matches!(
        swarm.run(Vec::<String>::new()).await,
        Err(Error::TooManyErrors { count: 3, .. })
    ));
}

#[tokio::test]
async fn test_swarm_gives_up_on_broken_sink() {
    let sink = EveryNthFails { nth: 1, calls: 0, out: Vec::new() };
    let config = HiveConfig::new(10, 12).max_consecutive_errors(5);
    let swarm = Swarm::new(config, Alphabet::default(), HashStore::new(), 2).unwrap();
    assert!(matches!(swarm.run(sink).await, Err(Error::TooManyErrors { count: 5, .. })));
}

#[test]
fn test_swarm_race_on_shared_store() {
    const WORKERS: usize = 32;
    let store = HashStore::new();
    let barrier = std::sync::Barrier::new(WORKERS);

    let wins: usize = std::thread::scope(|s| {
        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    usize::from(store.check_and_insert("identical").unwrap())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(wins, 1);
    assert_eq!(store.count(), 1);
}
