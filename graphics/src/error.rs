//! Graphics error types.

use std::fmt;

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to create a GPU resource on the render thread.
    ResourceCreationFailed(String),
    /// A shader stage failed to compile.
    ShaderCompileFailed {
        /// Label of the shader entry.
        label: String,
        /// Compiler log returned by the driver.
        log: String,
    },
    /// A shader program failed to link.
    ProgramLinkFailed {
        /// Label of the shader entry.
        label: String,
        /// Linker log returned by the driver.
        log: String,
    },
    /// An image asset could not be decoded.
    ImageDecodeFailed {
        /// Identity of the asset that failed.
        path: String,
        /// Decoder error message.
        reason: String,
    },
    /// An invalid parameter was provided.
    InvalidParameter(String),
    /// A resource identity could not be resolved.
    InvalidIdentity(String),
    /// The requested backend is not compiled in or not available.
    BackendUnavailable(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::ShaderCompileFailed { label, log } => {
                write!(f, "shader '{label}' failed to compile: {log}")
            }
            Self::ProgramLinkFailed { label, log } => {
                write!(f, "program '{label}' failed to link: {log}")
            }
            Self::ImageDecodeFailed { path, reason } => {
                write!(f, "failed to decode image '{path}': {reason}")
            }
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::InvalidIdentity(msg) => write!(f, "invalid resource identity: {msg}"),
            Self::BackendUnavailable(msg) => write!(f, "backend unavailable: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}

impl From<silkweed_vfs::VfsError> for GraphicsError {
    fn from(err: silkweed_vfs::VfsError) -> Self {
        match err {
            silkweed_vfs::VfsError::InvalidPath(reason) => Self::InvalidIdentity(reason),
            other => Self::ResourceCreationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::ResourceCreationFailed("texture too large".to_string());
        assert_eq!(err.to_string(), "resource creation failed: texture too large");

        let err = GraphicsError::ShaderCompileFailed {
            label: "forward".to_string(),
            log: "0:12 syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "shader 'forward' failed to compile: 0:12 syntax error"
        );
    }

    #[test]
    fn test_vfs_error_conversion() {
        let err: GraphicsError =
            silkweed_vfs::VfsError::InvalidPath("path escapes the root".to_string()).into();
        assert!(matches!(err, GraphicsError::InvalidIdentity(_)));
    }
}
