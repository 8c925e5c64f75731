use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use pwhive::{Alphabet, DEFAULT_POOL};

use crate::MAX_PREALLOCATED_ENTRIES;
use crate::error::Error;

/// Opens the destination for generated passwords: `path` if given, stdout
/// otherwise. An existing file is only replaced when `force` is set.
pub fn open_output(path: Option<&Path>, force: bool) -> Result<Box<dyn Write + Send>, Error> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    };

    if path.exists() && !force {
        return Err(Error::FileExists { path: path.to_path_buf() });
    }

    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Builds the alphabet from a custom symbol pool (or the default one),
/// optionally cut down to its first `size` distinct symbols.
pub fn build_alphabet(symbols: Option<&str>, size: Option<usize>) -> Result<Alphabet, Error> {
    let pool = symbols.unwrap_or(DEFAULT_POOL);
    let alphabet = match size {
        Some(size) => Alphabet::with_size(pool.chars(), size)?,
        None => Alphabet::new(pool.chars())?,
    };
    Ok(alphabet)
}

/// Entries to pre-allocate in a hash store for a run of `count` passwords.
pub fn store_capacity_hint(count: u64) -> usize {
    count.min(MAX_PREALLOCATED_ENTRIES) as usize
}
