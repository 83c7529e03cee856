//! One-line metadata summaries.

use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::operation::{OpError, blocking};

/// Metadata of a single path, as shown by the `stat` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub path: PathBuf,
    pub kind: &'static str,
    pub size: u64,
    pub permissions: String,
    pub modified: Option<DateTime<Local>>,
}

impl FileStat {
    fn from_metadata(path: PathBuf, meta: &Metadata) -> Self {
        let kind = if meta.file_type().is_symlink() {
            "link"
        } else if meta.is_dir() {
            "directory"
        } else if meta.is_file() {
            "file"
        } else {
            "special"
        };
        Self {
            path,
            kind,
            size: meta.len(),
            permissions: permission_string(meta),
            modified: meta.modified().ok().map(DateTime::<Local>::from),
        }
    }
}

impl fmt::Display for FileStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modified = self
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{} {} {} {} {}",
            self.permissions,
            humansize::format_size(self.size, humansize::BINARY),
            modified,
            self.kind,
            self.path.display()
        )
    }
}

/// Read metadata of `path` without following a final symlink.
pub async fn stat(path: PathBuf) -> Result<FileStat, OpError> {
    blocking(move || {
        let meta = std::fs::symlink_metadata(&path).map_err(|e| OpError::io(&path, e))?;
        Ok(FileStat::from_metadata(path, &meta))
    })
    .await
}

/// `rwxr-xr-x` style permissions.
#[cfg(unix)]
fn permission_string(meta: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode();
    let mut out = String::with_capacity(9);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn permission_string(meta: &Metadata) -> String {
    if meta.permissions().readonly() {
        "r--".to_string()
    } else {
        "rw-".to_string()
    }
}

/// Whether `path` exists as anything, dangling links included.
fn exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// The members of `paths` that still exist.
pub async fn existing(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>, OpError> {
    blocking(move || Ok(paths.into_iter().filter(|p| exists(p)).collect())).await
}

/// Metadata of `path` with links followed, or `None` when it cannot be read.
pub async fn resolve(path: PathBuf) -> Result<Option<Metadata>, OpError> {
    blocking(move || Ok(std::fs::metadata(&path).ok())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stat_line() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("data.bin");
        std::fs::write(&file, vec![0u8; 2048]).unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o640)).unwrap();

        let info = stat(file.clone()).await.unwrap();
        assert_eq!(info.kind, "file");
        assert_eq!(info.size, 2048);
        assert_eq!(info.permissions, "rw-r-----");

        let line = info.to_string();
        assert!(line.starts_with("rw-r----- 2 KiB "));
        assert!(line.ends_with(&file.display().to_string()));
    }

    #[tokio::test]
    async fn test_stat_missing() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(stat(temp.path().join("nope")).await.is_err());
        assert!(!exists(&temp.path().join("nope")));
        assert!(exists(temp.path()));
    }

    #[tokio::test]
    async fn test_existing_keeps_present_paths() {
        let temp = tempfile::TempDir::new().unwrap();
        let here = temp.path().join("here");
        std::fs::write(&here, "h").unwrap();

        let kept = existing(vec![temp.path().join("gone"), here.clone()]).await.unwrap();
        assert_eq!(kept, vec![here.clone()]);

        assert!(resolve(here).await.unwrap().unwrap().is_file());
        assert!(resolve(temp.path().join("gone")).await.unwrap().is_none());
    }
}
