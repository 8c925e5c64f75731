//! Generates large batches of unique random passwords.
//!
//! Each password is `pw_len` symbols drawn uniformly from an [`Alphabet`] by a
//! [`RandomSource`] that is seeded once from the operating system's secure
//! random number generator. Before a password is written to a [`Sink`] it is
//! checked into a [`UniquenessStore`], so no password is ever emitted twice.
//!
//! # Example
//!
//! ```no_run
//! use pwhive::{Alphabet, HashStore, Hive, HiveConfig, WriteSink};
//!
//! let config = HiveConfig::new(1_000, 12);
//! let sink = WriteSink::new(std::io::stdout().lock());
//! let mut hive = Hive::new(config, Alphabet::default(), HashStore::with_capacity(1_000), sink)?;
//! let summary = hive.generate()?;
//! eprintln!("{summary}");
//! hive.close();
//! # Ok::<(), pwhive::Error>(())
//! ```
//!
//! # Choosing a store
//!
//! [`HashStore`] is the default and the fastest: a sharded hash set with
//! expected constant-time lookups. [`TrieStore`] keeps entries in a prefix tree,
//! trading throughput for memory that grows one node at a time.
//!
//! # Concurrency
//!
//! With the `tokio` feature, [`Swarm`] runs several workers, each with its own
//! random source, against one shared store, while a single writer task owns
//! the sink.
//!
//! # Capacity
//!
//! An alphabet of `K` symbols yields `K^pw_len` distinct passwords. Asking for
//! more fails up front with [`Error::Capacity`] instead of looping forever.

pub mod alphabet;
pub mod error;
pub mod generator;
pub mod hive;
pub mod random;
pub mod sink;
pub mod store;
#[cfg(feature = "tokio")]
pub mod swarm;
pub mod trie;

pub use alphabet::{Alphabet, DEFAULT_POOL};
pub use error::{Error, SinkError, StoreError};
pub use generator::generate;
pub use hive::{Hive, HiveConfig, HiveState, Summary};
pub use random::RandomSource;
pub use sink::{Sink, WriteSink};
pub use store::{HashStore, UniquenessStore};
#[cfg(feature = "tokio")]
pub use swarm::Swarm;
pub use trie::TrieStore;
