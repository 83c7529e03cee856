//! File and directory creation.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::operation::{OpError, blocking, ensure_parent, ensure_vacant};
use crate::progress::{OperationComplete, OperationType};
use crate::rename::check_name;

/// What [`create`] should make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateKind {
    File,
    Directory,
}

/// Resolve user input relative to `base`: a trailing `/` asks for a directory.
pub fn parse_new_entry(base: &Path, input: &str) -> (PathBuf, CreateKind) {
    let kind = if input.ends_with('/') {
        CreateKind::Directory
    } else {
        CreateKind::File
    };
    let trimmed = input.trim_end_matches('/');
    (base.join(trimmed), kind)
}

/// Create a file or directory at `path`, along with any missing parents.
pub async fn create(path: PathBuf, kind: CreateKind) -> Result<OperationComplete, OpError> {
    check_name(&path)?;
    blocking(move || {
        ensure_vacant(&path)?;
        match kind {
            CreateKind::Directory => {
                fs::create_dir_all(&path).map_err(|e| OpError::io(&path, e))?;
            }
            CreateKind::File => {
                ensure_parent(&path)?;
                OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&path)
                    .map_err(|e| OpError::io(&path, e))?;
            }
        }
        tracing::info!(path = %path.display(), ?kind, "created");

        let mut complete = OperationComplete::new(OperationType::Create);
        complete.created.push(path.clone());
        complete.touched.push(path);
        Ok(complete)
    })
    .await
}
