//! Command-line front end for the `pwhive` library: writes a batch of unique
//! random passwords, one per line, to a file or to stdout.
//!
//! # Usage
//!
//! Generate 1.4 million 12-character passwords into a file:
//!
//! ```sh
//! pwhive-gen --count 1400000 --length 12 --output passwords.txt
//! ```
//!
//! Use four workers sharing one store, and the prefix-tree store instead of
//! the default hash set:
//!
//! ```sh
//! pwhive-gen -n 5000000 -j 4 --store trie -o passwords.txt
//! ```
//!
//! The run summary goes to stderr, so stdout can be piped elsewhere. Set
//! `RUST_LOG=debug` for per-run details.

pub mod error;
pub mod output;

pub use error::Error;
pub use output::{build_alphabet, open_output, store_capacity_hint};

/// Upper bound on entries pre-allocated in a hash store, whatever the count.
pub const MAX_PREALLOCATED_ENTRIES: u64 = 1 << 24;

/// Which uniqueness store backs the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreKind {
    /// Sharded hash set (fastest).
    Hash,
    /// Prefix tree (incremental memory growth).
    Trie,
}
