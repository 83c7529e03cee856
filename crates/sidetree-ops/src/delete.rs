//! Permanent deletion and trash.

use std::fs;
use std::path::PathBuf;

use crate::operation::{OpError, blocking};
use crate::progress::{OperationComplete, OperationType};

/// Remove every path in `paths`, directories recursively.
///
/// Failures are logged and counted; the rest of the batch still runs.
pub async fn delete(paths: Vec<PathBuf>) -> Result<OperationComplete, OpError> {
    blocking(move || {
        let mut complete = OperationComplete::new(OperationType::Delete);
        for path in paths {
            let result = match fs::symlink_metadata(&path) {
                Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path),
                Ok(_) => fs::remove_file(&path),
                Err(err) => Err(err),
            };
            match result {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "deleted");
                    complete.touched.push(path);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "delete failed");
                    complete.failed += 1;
                }
            }
        }
        Ok(complete)
    })
    .await
}

/// Move every path in `paths` to the platform trash.
pub async fn trash(paths: Vec<PathBuf>) -> Result<OperationComplete, OpError> {
    blocking(move || {
        let mut complete = OperationComplete::new(OperationType::Trash);
        if paths.is_empty() {
            return Ok(complete);
        }
        trash::delete_all(&paths).map_err(|e| OpError::Trash {
            path: paths[0].clone(),
            message: e.to_string(),
        })?;
        tracing::info!(count = paths.len(), "trashed");
        complete.touched = paths;
        Ok(complete)
    })
    .await
}
