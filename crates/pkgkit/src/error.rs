//! Error types for package manager operations.
//!
//! Only conditions the caller cannot route around become errors. A command
//! that exits non-zero, output that does not match a backend's grammar and an
//! operation a backend does not offer are reported as values instead (see
//! [`CommandStatus`](crate::CommandStatus)), so control flow stays the same
//! on every platform.

use thiserror::Error;

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The host platform could not be determined
    Resolution,
    /// No backend exists for the host platform
    Unsupported,
    /// The API was called with arguments it cannot work with
    Usage,
    /// The operation history store failed
    Storage,
    /// Filesystem or process plumbing failed
    Io,
}

impl ErrorCategory {
    /// Whether the program cannot continue after an error of this category.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Resolution | Self::Unsupported | Self::Storage)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Resolution => "Platform could not be determined",
            Self::Unsupported => "Platform not supported",
            Self::Usage => "Invalid request",
            Self::Storage => "History database failure",
            Self::Io => "I/O failure",
        }
    }
}

/// Errors that can occur while resolving, building or recording operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Neither the release descriptor nor `uname` identified the platform
    #[error("cannot determine platform: {message}")]
    Resolution {
        /// What went wrong during detection
        message: String,
    },

    /// No backend handles this platform
    #[error("unsupported platform: {name}")]
    UnsupportedPlatform {
        /// Platform name as reported by the resolver
        name: String,
    },

    /// The backend picks its executable per operation and none was given
    #[error("{backend} needs an operation to build its command prefix")]
    MissingOperation {
        /// Backend that rejected the call
        backend: &'static str,
    },

    /// An operation name that does not correspond to any [`Operation`](crate::Operation)
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// History database error
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Resolution { .. } => ErrorCategory::Resolution,
            Self::UnsupportedPlatform { .. } => ErrorCategory::Unsupported,
            Self::MissingOperation { .. } | Self::UnknownOperation(_) => ErrorCategory::Usage,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Io(_) => ErrorCategory::Io,
        }
    }

    /// Whether the program cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        self.category().is_fatal()
    }
}

/// Result type for package manager operations.
pub type Result<T> = std::result::Result<T, Error>;
