use crate::alphabet::Alphabet;
use crate::random::RandomSource;

/// Builds one candidate of exactly `pw_len` symbols drawn independently from
/// `alphabet`.
///
/// The buffer is sized up front so the hot loop never reallocates.
#[inline]
pub fn generate(pw_len: usize, alphabet: &Alphabet, rng: &mut RandomSource) -> String {
    let mut candidate = String::with_capacity(pw_len * alphabet.max_symbol_len());
    let k = alphabet.size();
    for _ in 0..pw_len {
        candidate.push(alphabet.symbol_at(rng.next(k)));
    }
    candidate
}
