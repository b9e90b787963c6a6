//! Error type for the command-line front end.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The codec rejected its input or failed on I/O
    #[error(transparent)]
    Codec(#[from] bitcodec_core::Error),

    /// Filesystem error outside a codec call
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The suffix does not name a supported format
    #[error("{}: unsupported file type (expected .hh, .ll or .zh)", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Path cannot be stored as an archive entry name
    #[error("{}: path is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),

    /// Archive entry would be written outside the working directory
    #[error("refusing to extract entry {0:?}: absolute or parent-relative path")]
    UnsafeEntryName(String),

    /// A demo round trip did not reproduce its input
    #[error("{0} round trip did not reproduce the input")]
    Verification(&'static str),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Attach the path to an I/O error.
pub fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> AppError {
    let path = path.into();
    move |source| AppError::Io { path, source }
}
