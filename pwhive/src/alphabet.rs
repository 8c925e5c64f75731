use crate::error::Error;

/// Symbols offered when no custom pool is given: `A-Z`, `1-9`, `0`, `a-z`.
///
/// The pool lists `i` twice. [`Alphabet::new`] drops the repeat so every
/// symbol is drawn with the same probability, leaving 62 symbols.
pub const DEFAULT_POOL: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890abcdefghijiklmnopqrstuvwxyz";

/// Ordered set of distinct symbols a password may be built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    /// Builds an alphabet from `symbols`, keeping the first occurrence of each.
    pub fn new(symbols: impl IntoIterator<Item = char>) -> Result<Self, Error> {
        let symbols = distinct(symbols);
        if symbols.is_empty() {
            return Err(Error::EmptyAlphabet);
        }

        Ok(Self { symbols })
    }

    /// Builds an alphabet of exactly `size` symbols, taken in order from the
    /// distinct symbols of `symbols`.
    pub fn with_size(symbols: impl IntoIterator<Item = char>, size: usize) -> Result<Self, Error> {
        let mut alphabet = Self::new(symbols)?;
        if size == 0 {
            return Err(Error::EmptyAlphabet);
        }
        if size > alphabet.size() {
            return Err(Error::AlphabetTooSmall { requested: size, distinct: alphabet.size() });
        }
        alphabet.symbols.truncate(size);
        Ok(alphabet)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    /// Returns the symbol at `index`. Panics if `index >= self.size()`.
    #[inline]
    pub fn symbol_at(&self, index: usize) -> char {
        self.symbols[index]
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn contains(&self, c: char) -> bool {
        self.symbols.contains(&c)
    }

    /// Longest UTF-8 encoding among the symbols, used to pre-size buffers.
    pub(crate) fn max_symbol_len(&self) -> usize {
        self.symbols.iter().map(|c| c.len_utf8()).max().unwrap_or(1)
    }

    /// Number of distinct strings of `pw_len` symbols (`size ^ pw_len`).
    ///
    /// `None` means the count does not fit in a `u128`, which is treated as
    /// unbounded.
    pub fn capacity(&self, pw_len: usize) -> Option<u128> {
        let exp = u32::try_from(pw_len).ok()?;
        (self.size() as u128).checked_pow(exp)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self { symbols: distinct(DEFAULT_POOL.chars()) }
    }
}

// Alphabets are small, so a linear scan beats hashing here.
fn distinct(symbols: impl IntoIterator<Item = char>) -> Vec<char> {
    let mut out: Vec<char> = Vec::new();
    for c in symbols {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}
