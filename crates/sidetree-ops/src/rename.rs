//! Rename operation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::operation::{OpError, blocking, ensure_parent, ensure_vacant};
use crate::progress::{OperationComplete, OperationType};

/// Rename (or move) `source` to `dest`, creating missing parents of `dest`.
///
/// Both parents are reported as touched so both listings get re-scanned.
pub async fn rename(source: PathBuf, dest: PathBuf) -> Result<OperationComplete, OpError> {
    check_name(&dest)?;
    blocking(move || {
        if source == dest {
            return Ok(OperationComplete::new(OperationType::Rename));
        }
        fs::symlink_metadata(&source).map_err(|e| OpError::io(&source, e))?;
        ensure_vacant(&dest)?;
        ensure_parent(&dest)?;
        fs::rename(&source, &dest).map_err(|e| OpError::io(&source, e))?;
        tracing::info!(from = %source.display(), to = %dest.display(), "renamed");

        let mut complete = OperationComplete::new(OperationType::Rename);
        complete.created.push(dest.clone());
        complete.touched.extend([source, dest]);
        Ok(complete)
    })
    .await
}

/// Validate the final component of `path`.
pub(crate) fn check_name(path: &Path) -> Result<(), OpError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    validate_filename(&name).map_err(|reason| OpError::InvalidName { name, reason })
}

/// Validate a filename for cross-platform compatibility.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 bytes)".into());
    }

    for c in ['/', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c.escape_default()));
        }
    }

    #[cfg(target_os = "windows")]
    {
        for c in ['\\', ':', '*', '?', '"', '<', '>', '|'] {
            if name.contains(c) {
                return Err(format!("Name cannot contain '{}'", c));
            }
        }

        let reserved = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        let upper_name = name.to_uppercase();
        let base_name = upper_name.split('.').next().unwrap_or("");
        if reserved.contains(&base_name) {
            return Err("Reserved filename".into());
        }
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}
