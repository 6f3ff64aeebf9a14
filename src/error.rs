use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `rotarch` crate.
#[derive(Debug, Error)]
pub enum RotateError {
    /// The requested policy is inconsistent. Raised before any entry is touched.
    #[error("Invalid retention policy: {0}")]
    Validation(String),

    /// A literal cutoff timestamp could not be parsed.
    #[error("Invalid timestamp '{input}': expected RFC 3339, 'YYYY-MM-DD HH:MM:SS' or a date")]
    InvalidTimestamp { input: String },

    /// A root path could not be enumerated.
    #[error("Path not found: '{}'", path.display())]
    PathNotFound { path: PathBuf },

    /// An I/O error occurred while acting on an entry.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// The zip writer failed while producing an archive.
    #[error("Archive error on path '{}': {source}", path.display())]
    Archive {
        #[source]
        source: zip::result::ZipError,
        path: PathBuf,
    },
}

impl RotateError {
    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        RotateError::Io { source, path: path.into() }
    }
}

pub type Result<T> = std::result::Result<T, RotateError>;
