//! Executable-bit toggling.

use std::path::PathBuf;

use crate::operation::{OpError, blocking};
use crate::progress::{OperationComplete, OperationType};

/// Flip each of the user/group/other execute bits on every regular file in `paths`.
///
/// Directories and paths that no longer exist are skipped.
pub async fn toggle_exec(paths: Vec<PathBuf>) -> Result<OperationComplete, OpError> {
    blocking(move || {
        let mut complete = OperationComplete::new(OperationType::ToggleExec);
        for path in paths {
            let Ok(meta) = std::fs::metadata(&path) else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            flip(&path, &meta)?;
            complete.touched.push(path);
        }
        Ok(complete)
    })
    .await
}

#[cfg(unix)]
fn flip(path: &std::path::Path, meta: &std::fs::Metadata) -> Result<(), OpError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode();
    let next = mode ^ 0o111;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(next))
        .map_err(|e| OpError::io(path, e))?;
    tracing::info!(path = %path.display(), mode = format!("{next:o}"), "exec toggled");
    Ok(())
}

#[cfg(not(unix))]
fn flip(_path: &std::path::Path, _meta: &std::fs::Metadata) -> Result<(), OpError> {
    Err(OpError::Unsupported {
        operation: "toggle_exec",
    })
}
