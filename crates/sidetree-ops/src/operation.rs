//! Operation errors and the blocking-task helper.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// An error that occurred during a file operation.
#[derive(Debug, Error)]
pub enum OpError {
    /// The requested name is not usable.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The destination is already taken.
    #[error("'{}' already exists", path.display())]
    AlreadyExists { path: PathBuf },

    /// Generic I/O error.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Moving to the trash failed.
    #[error("Failed to trash {}: {message}", path.display())]
    Trash { path: PathBuf, message: String },

    /// The operation is not available on this platform.
    #[error("{operation} is not supported on this platform")]
    Unsupported { operation: &'static str },

    /// The blocking task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(String),
}

impl OpError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Fail if anything (including a dangling link) exists at `path`.
pub(crate) fn ensure_vacant(path: &Path) -> Result<(), OpError> {
    if std::fs::symlink_metadata(path).is_ok() {
        return Err(OpError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Create the parent directory of `path` if needed.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), OpError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| OpError::io(parent, e))?;
    }
    Ok(())
}

/// Run blocking filesystem work off the async runtime.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, OpError>
where
    F: FnOnce() -> Result<T, OpError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| OpError::Task(e.to_string()))?
}
