use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Error;

/// Number of entropy bytes consumed to seed a [`RandomSource`].
pub const SEED_LEN: usize = 8;

/// Fast uniform index generator seeded from secure entropy.
///
/// Only the starting state comes from the OS CSPRNG; draws after that use
/// `StdRng`, so the sequence is unpredictable to start with but cheap to extend.
/// Each producer must own its own instance.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    /// Seeds from the first [`SEED_LEN`] bytes of `seed` (little-endian).
    pub fn from_seed_bytes(seed: &[u8]) -> Result<Self, Error> {
        let Some(head) = seed.first_chunk::<SEED_LEN>() else {
            return Err(Error::Seed {
                needed: SEED_LEN,
                reason: format!("only {} bytes supplied", seed.len()),
            });
        };

        Ok(Self { rng: StdRng::seed_from_u64(u64::from_le_bytes(*head)) })
    }

    /// Seeds from the operating system's secure random number generator.
    pub fn from_entropy() -> Result<Self, Error> {
        let mut seed = [0u8; SEED_LEN];
        getrandom::fill(&mut seed)
            .map_err(|e| Error::Seed { needed: SEED_LEN, reason: e.to_string() })?;
        Self::from_seed_bytes(&seed)
    }

    /// Returns a uniform value in `[0, bound)`.
    ///
    /// `random_range` rejects out-of-zone samples, so there is no modulo bias.
    /// Panics if `bound` is zero.
    #[inline]
    pub fn next(&mut self, bound: usize) -> usize {
        self.rng.random_range(0..bound)
    }
}
