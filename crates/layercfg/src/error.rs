//! error type shared by all layers
use std::path::PathBuf;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Not an existing file or directory: {}", .0.display())]
    InvalidSource(PathBuf),
    #[error("Unable to load {}: {reason}", .path.display())]
    MalformedSource { path: PathBuf, reason: String },
    #[error("Cyclic resolution at {key}")]
    CyclicResolution { key: String },
    #[error("No writable layer")]
    ReadOnly,
}

impl Error {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Error::MalformedSource {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
