use std::fmt;

/// Failure modes of asset source access.
#[derive(Debug)]
pub enum VfsError {
    /// No asset lives at this path in the queried source.
    NotFound(String),
    /// The underlying storage failed for a reason other than absence.
    Io(std::io::Error),
    /// The path could not be normalized; the payload says why.
    InvalidPath(String),
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::NotFound(path) => write!(f, "no asset at '{path}'"),
            VfsError::Io(err) => write!(f, "asset storage failure: {err}"),
            VfsError::InvalidPath(reason) => write!(f, "unusable asset path: {reason}"),
        }
    }
}

impl std::error::Error for VfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let VfsError::Io(err) = self {
            Some(err)
        } else {
            None
        }
    }
}
