use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::alphabet::Alphabet;
use crate::error::Error;
use crate::generator::generate;
use crate::random::RandomSource;
use crate::sink::Sink;
use crate::store::UniquenessStore;

/// Parameters of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiveConfig {
    /// Number of unique passwords to deliver.
    pub gen_len: u64,
    /// Symbols per password.
    pub pw_len: usize,
    /// Abort after this many failed slots in a row. `None` retries forever.
    pub max_consecutive_errors: Option<u64>,
}

impl HiveConfig {
    pub fn new(gen_len: u64, pw_len: usize) -> Self {
        Self { gen_len, pw_len, max_consecutive_errors: None }
    }

    pub fn max_consecutive_errors(mut self, limit: u64) -> Self {
        self.max_consecutive_errors = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.pw_len == 0 {
            return Err(Error::InvalidLength);
        }
        Ok(())
    }

    /// Fails if `alphabet` cannot supply `gen_len` distinct passwords of
    /// `pw_len` symbols on top of the `stored` strings a store already holds.
    /// Without this check such a run would never finish.
    pub fn check_capacity(&self, alphabet: &Alphabet, stored: usize) -> Result<(), Error> {
        ensure_capacity(alphabet, self.pw_len, self.gen_len, stored as u128)
    }
}

/// Fails if fewer than `wanted` strings of `pw_len` symbols remain once
/// `stored` of them are taken.
fn ensure_capacity(
    alphabet: &Alphabet,
    pw_len: usize,
    wanted: u64,
    stored: u128,
) -> Result<(), Error> {
    let Some(total) = alphabet.capacity(pw_len) else {
        return Ok(());
    };
    let capacity = total.saturating_sub(stored);
    if u128::from(wanted) > capacity {
        return Err(Error::Capacity { requested: wanted, capacity });
    }
    Ok(())
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Passwords delivered to the sink.
    pub generated: u64,
    /// Candidates rejected because they were already stored.
    pub collisions: u64,
    /// Slots retried after a store or sink failure.
    pub errors: u64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "There were {} passwords generated with {} collisions and {} errors.",
            self.generated, self.collisions, self.errors
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiveState {
    Running,
    Completed,
}

/// Outcome of one attempt at filling the current output slot.
enum Slot {
    Accepted,
    Collision,
    Failed(Error),
}

/// Sequential generator: one random source, one store, one sink.
///
/// Each slot is filled by generating a candidate, checking it into the store
/// and emitting it. Collisions and failures retry the same slot, so a finished
/// run has delivered exactly `gen_len` distinct passwords. A candidate the sink
/// rejected is emitted again on the next attempt rather than replaced, so sink
/// failures never use up the alphabet's space.
pub struct Hive<S, W> {
    config: HiveConfig,
    alphabet: Alphabet,
    rng: RandomSource,
    store: S,
    sink: W,
    state: HiveState,
    summary: Summary,
    progress: Option<Arc<AtomicU64>>,
    // Stored but not yet delivered.
    pending: Option<String>,
}

impl<S: UniquenessStore, W: Sink> Hive<S, W> {
    /// Creates a hive whose random source is seeded from OS entropy.
    pub fn new(config: HiveConfig, alphabet: Alphabet, store: S, sink: W) -> Result<Self, Error> {
        Self::with_random_source(config, alphabet, store, sink, RandomSource::from_entropy()?)
    }

    pub fn with_random_source(
        config: HiveConfig,
        alphabet: Alphabet,
        store: S,
        sink: W,
        rng: RandomSource,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            alphabet,
            rng,
            store,
            sink,
            state: HiveState::Running,
            summary: Summary::default(),
            progress: None,
            pending: None,
        })
    }

    /// Publishes the delivered count to `progress` after every accepted slot.
    pub fn with_progress(mut self, progress: Arc<AtomicU64>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> HiveState {
        self.state
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs until `gen_len` passwords have been delivered and flushed.
    ///
    /// Calling this again on a completed hive returns the same summary
    /// without generating anything.
    pub fn generate(&mut self) -> Result<Summary, Error> {
        if self.state == HiveState::Completed {
            return Ok(self.summary);
        }
        // A pending candidate is already stored and fills one of the wanted slots.
        let pending = u64::from(self.pending.is_some());
        ensure_capacity(
            &self.alphabet,
            self.config.pw_len,
            self.config.gen_len - self.summary.generated - pending,
            self.store.count() as u128,
        )?;

        debug!(
            gen_len = self.config.gen_len,
            pw_len = self.config.pw_len,
            alphabet = self.alphabet.size(),
            "starting generation"
        );

        let mut consecutive_errors = 0u64;
        while self.summary.generated < self.config.gen_len {
            match self.fill_slot() {
                Slot::Accepted => {
                    consecutive_errors = 0;
                    self.summary.generated += 1;
                    if let Some(progress) = &self.progress {
                        progress.store(self.summary.generated, Ordering::Relaxed);
                    }
                }
                Slot::Collision => self.summary.collisions += 1,
                Slot::Failed(e) => {
                    warn!(error = %e, slot = self.summary.generated, "slot failed, retrying");
                    self.summary.errors += 1;
                    consecutive_errors += 1;
                    let limit = self.config.max_consecutive_errors;
                    if limit.is_some_and(|max| consecutive_errors >= max) {
                        return Err(Error::TooManyErrors {
                            count: consecutive_errors,
                            last: e.to_string(),
                        });
                    }
                }
            }
        }

        self.sink.flush()?;
        self.state = HiveState::Completed;
        debug!(
            generated = self.summary.generated,
            collisions = self.summary.collisions,
            errors = self.summary.errors,
            "generation completed"
        );
        Ok(self.summary)
    }

    fn fill_slot(&mut self) -> Slot {
        let candidate = match self.pending.take() {
            Some(candidate) => candidate,
            None => {
                let candidate = generate(self.config.pw_len, &self.alphabet, &mut self.rng);
                match self.store.check_and_insert(&candidate) {
                    Ok(true) => candidate,
                    Ok(false) => return Slot::Collision,
                    Err(e) => return Slot::Failed(e.into()),
                }
            }
        };

        match self.sink.emit(&candidate) {
            Ok(()) => Slot::Accepted,
            Err(e) => {
                self.pending = Some(candidate);
                Slot::Failed(e.into())
            }
        }
    }

    /// Destroys the store and hands back the sink.
    pub fn close(self) -> W {
        let released = self.store.destroy();
        debug!(released, "uniqueness store destroyed");
        self.sink
    }
}
