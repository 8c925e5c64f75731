//! Multi-worker generation.
//!
//! Every worker owns its own securely seeded [`RandomSource`] and runs on
//! tokio's blocking pool. Workers share one [`UniquenessStore`] and hand
//! accepted passwords to a single writer task over a bounded channel, so a slow
//! sink pushes back on the generators instead of buffering without limit.
//!
//! Output slots are reserved through a shared counter before a worker starts
//! looking for a fresh candidate, which keeps the number of passwords in
//! flight at or below `gen_len`. A worker that finds every slot taken is done.
//! When the writer fails to emit a password it retries that same password, so
//! a claimed slot is never handed back.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::alphabet::Alphabet;
use crate::error::Error;
use crate::generator::generate;
use crate::hive::{HiveConfig, Summary};
use crate::random::RandomSource;
use crate::sink::Sink;
use crate::store::UniquenessStore;

/// Capacity of the channel between the workers and the writer.
pub const QUEUE_DEPTH: usize = 1024;

#[derive(Default)]
struct Shared {
    claimed: AtomicU64,
    collisions: AtomicU64,
    errors: AtomicU64,
    done: CancellationToken,
}

impl Shared {
    /// Reserves one output slot if fewer than `gen_len` are taken.
    fn claim(&self, gen_len: u64) -> bool {
        self.claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| (c < gen_len).then_some(c + 1))
            .is_ok()
    }
}

/// Concurrent counterpart of [`Hive`](crate::Hive).
pub struct Swarm<S> {
    config: HiveConfig,
    alphabet: Arc<Alphabet>,
    store: Arc<S>,
    sources: Vec<RandomSource>,
    progress: Option<Arc<AtomicU64>>,
}

impl<S: UniquenessStore + 'static> Swarm<S> {
    /// Creates a swarm of `workers` workers (at least one), each seeded
    /// independently from OS entropy.
    pub fn new(
        config: HiveConfig,
        alphabet: Alphabet,
        store: S,
        workers: usize,
    ) -> Result<Self, Error> {
        let sources =
            (0..workers.max(1)).map(|_| RandomSource::from_entropy()).collect::<Result<_, _>>()?;
        Self::with_random_sources(config, alphabet, store, sources)
    }

    /// Creates one worker per random source.
    pub fn with_random_sources(
        config: HiveConfig,
        alphabet: Alphabet,
        store: S,
        sources: Vec<RandomSource>,
    ) -> Result<Self, Error> {
        config.validate()?;
        if sources.is_empty() {
            return Err(Error::Worker("a swarm needs at least one worker".to_string()));
        }
        Ok(Self {
            config,
            alphabet: Arc::new(alphabet),
            store: Arc::new(store),
            sources,
            progress: None,
        })
    }

    /// Publishes the delivered count to `progress` after every emitted password.
    pub fn with_progress(mut self, progress: Arc<AtomicU64>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn workers(&self) -> usize {
        self.sources.len()
    }

    /// Runs every worker to completion and returns the summary together with
    /// the store and the sink.
    pub async fn run<W>(self, sink: W) -> Result<(Summary, S, W), Error>
    where
        W: Sink + Send + 'static,
    {
        self.config.check_capacity(&self.alphabet, self.store.count())?;

        let gen_len = self.config.gen_len;
        let shared = Arc::new(Shared::default());
        let (tx, rx) = mpsc::channel::<String>(QUEUE_DEPTH);

        debug!(
            gen_len,
            pw_len = self.config.pw_len,
            workers = self.sources.len(),
            "starting swarm"
        );

        let writer = {
            let shared = Arc::clone(&shared);
            let progress = self.progress.clone();
            let limit = self.config.max_consecutive_errors;
            tokio::task::spawn_blocking(move || {
                write_loop(sink, rx, gen_len, limit, &shared, progress.as_deref())
            })
        };

        let mut handles = Vec::with_capacity(self.sources.len());
        for (id, rng) in self.sources.into_iter().enumerate() {
            let worker = Worker {
                id,
                config: self.config,
                alphabet: Arc::clone(&self.alphabet),
                store: Arc::clone(&self.store),
                rng,
                shared: Arc::clone(&shared),
                tx: tx.clone(),
            };
            handles.push(tokio::task::spawn_blocking(move || worker.run()));
        }
        drop(tx);

        // Wait for all workers to complete
        let mut first_error: Option<Error> = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(e) => {
                    shared.done.cancel();
                    if first_error.is_none() {
                        first_error = Some(Error::Worker(format!("task panicked: {e}")));
                    }
                }
            }
        }

        let written = match writer.await {
            Ok(result) => result,
            Err(e) => Err(Error::Worker(format!("writer panicked: {e}"))),
        };
        if let Some(e) = first_error {
            return Err(e);
        }
        let (sink, delivered) = written?;
        if delivered < gen_len {
            return Err(Error::Worker(format!(
                "workers stopped after delivering {delivered} of {gen_len} passwords"
            )));
        }

        let summary = Summary {
            generated: delivered,
            collisions: shared.collisions.load(Ordering::Relaxed),
            errors: shared.errors.load(Ordering::Relaxed),
        };
        debug!(%summary, "swarm completed");

        // Every task holding a clone has been joined.
        let store = Arc::try_unwrap(self.store)
            .map_err(|_| Error::Worker("store still shared after join".to_string()))?;
        Ok((summary, store, sink))
    }
}

struct Worker<S> {
    id: usize,
    config: HiveConfig,
    alphabet: Arc<Alphabet>,
    store: Arc<S>,
    rng: RandomSource,
    shared: Arc<Shared>,
    tx: mpsc::Sender<String>,
}

impl<S: UniquenessStore> Worker<S> {
    fn run(mut self) -> Result<(), Error> {
        while !self.shared.done.is_cancelled() {
            if !self.shared.claim(self.config.gen_len) {
                return Ok(());
            }
            let Some(candidate) = self.fill_slot()? else {
                return Ok(());
            };
            if self.tx.blocking_send(candidate).is_err() {
                // Writer is gone: it either finished or gave up.
                return Ok(());
            }
        }
        Ok(())
    }

    /// Generates until a candidate is new to the store. `None` means the run
    /// was cancelled first.
    fn fill_slot(&mut self) -> Result<Option<String>, Error> {
        let mut consecutive_errors = 0u64;
        loop {
            if self.shared.done.is_cancelled() {
                return Ok(None);
            }

            let candidate = generate(self.config.pw_len, &self.alphabet, &mut self.rng);
            match self.store.check_and_insert(&candidate) {
                Ok(true) => return Ok(Some(candidate)),
                Ok(false) => {
                    self.shared.collisions.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!(worker = self.id, error = %e, "store check failed, retrying");
                    self.shared.errors.fetch_add(1, Ordering::Relaxed);
                    consecutive_errors += 1;
                    let limit = self.config.max_consecutive_errors;
                    if limit.is_some_and(|max| consecutive_errors >= max) {
                        self.shared.done.cancel();
                        return Err(Error::TooManyErrors {
                            count: consecutive_errors,
                            last: e.to_string(),
                        });
                    }
                }
            }
        }
    }
}

/// Owns the sink. Returns it with the number of passwords delivered.
fn write_loop<W: Sink>(
    mut sink: W,
    mut rx: mpsc::Receiver<String>,
    gen_len: u64,
    max_consecutive_errors: Option<u64>,
    shared: &Shared,
    progress: Option<&AtomicU64>,
) -> Result<(W, u64), Error> {
    let mut delivered = 0u64;
    let mut consecutive_errors = 0u64;

    while delivered < gen_len {
        // All workers have exited; the caller reports the shortfall.
        let Some(password) = rx.blocking_recv() else {
            break;
        };

        // The password is already stored, so it is re-emitted until it lands.
        while let Err(e) = sink.emit(&password) {
            warn!(error = %e, slot = delivered, "sink write failed, retrying password");
            shared.errors.fetch_add(1, Ordering::Relaxed);
            consecutive_errors += 1;
            if max_consecutive_errors.is_some_and(|max| consecutive_errors >= max) {
                shared.done.cancel();
                return Err(Error::TooManyErrors { count: consecutive_errors, last: e.to_string() });
            }
        }

        consecutive_errors = 0;
        delivered += 1;
        if let Some(progress) = progress {
            progress.store(delivered, Ordering::Relaxed);
        }
    }

    shared.done.cancel();
    drop(rx);
    sink.flush()?;
    Ok((sink, delivered))
}
