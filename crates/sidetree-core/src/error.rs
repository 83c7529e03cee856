//! Error types shared by the walker and its callers.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from a single filesystem access.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Entry vanished or is unreadable: the walk drops it instead of failing.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::NotFound { .. })
    }
}

/// Errors surfaced by a tree walk submitted to the executor.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The walk observed its cancellation token and was abandoned.
    #[error("Walk cancelled")]
    Cancelled,

    /// The worker running the walk panicked.
    #[error("Walk worker panicked: {message}")]
    WorkerPanicked { message: String },

    /// The worker pool dropped the job without a result.
    #[error("Walk worker pool unavailable")]
    PoolClosed,

    /// The pool could not be created.
    #[error("Failed to start walk worker pool: {message}")]
    PoolBuild { message: String },

    /// Filesystem failure that could not be absorbed.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl WalkError {
    /// Check if this is the abandoned-by-cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));
        assert!(err.is_degraded());
    }

    #[test]
    fn test_other_io_is_not_degraded() {
        let err = ScanError::io("/x", std::io::Error::other("boom"));
        assert!(!err.is_degraded());
    }

    #[test]
    fn test_only_cancellation_is_cancelled() {
        assert!(WalkError::Cancelled.is_cancelled());
        assert!(!WalkError::PoolClosed.is_cancelled());
    }
}
