use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Hive(#[from] pwhive::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File '{path}' exists. Use --force to overwrite.")]
    FileExists { path: PathBuf },
}
