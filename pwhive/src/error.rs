#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {needed} bytes of secure entropy: {reason}")]
    Seed { needed: usize, reason: String },

    #[error("cannot produce {requested} unique passwords: only {capacity} remain at this length")]
    Capacity { requested: u64, capacity: u128 },

    #[error("password length must be at least 1")]
    InvalidLength,

    #[error("alphabet contains no symbols")]
    EmptyAlphabet,

    #[error("alphabet size {requested} exceeds the {distinct} distinct symbols available")]
    AlphabetTooSmall { requested: usize, distinct: usize },

    #[error("giving up after {count} consecutive failed slots, last error: {last}")]
    TooManyErrors { count: u64, last: String },

    #[error("store failed: {0}")]
    Store(#[from] StoreError),

    #[error("sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Failure of a single check-and-insert against a uniqueness store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not reserve memory for {entries} entries")]
    Exhausted { entries: usize },

    #[error("store lock poisoned by a panicking writer")]
    Poisoned,

    #[error("store corrupted: {0}")]
    Corrupt(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
