//! Relative symlink creation.

use std::path::{Component, Path, PathBuf};

use crate::operation::{OpError, blocking, ensure_parent, ensure_vacant};
use crate::progress::{OperationComplete, OperationType};
use crate::rename::check_name;

/// Express `target` relative to the directory `from`.
///
/// Both paths are expected to be absolute.
pub fn relative_to(target: &Path, from: &Path) -> PathBuf {
    let target: Vec<Component<'_>> = target.components().collect();
    let from: Vec<Component<'_>> = from.components().collect();
    let shared = target
        .iter()
        .zip(&from)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..from.len() {
        relative.push("..");
    }
    for component in &target[shared..] {
        relative.push(component.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

/// Create a symlink at `link` pointing at `target` through a relative path.
pub async fn link(target: PathBuf, link: PathBuf) -> Result<OperationComplete, OpError> {
    check_name(&link)?;
    blocking(move || {
        ensure_vacant(&link)?;
        ensure_parent(&link)?;
        let base = link.parent().unwrap_or(Path::new("/"));
        let relative = relative_to(&target, base);
        symlink(&target, &relative, &link)?;
        tracing::info!(link = %link.display(), target = %relative.display(), "linked");

        let mut complete = OperationComplete::new(OperationType::Link);
        complete.created.push(link.clone());
        complete.touched.push(link);
        Ok(complete)
    })
    .await
}

#[cfg(unix)]
fn symlink(_target: &Path, relative: &Path, link: &Path) -> Result<(), OpError> {
    std::os::unix::fs::symlink(relative, link).map_err(|e| OpError::io(link, e))
}

#[cfg(windows)]
fn symlink(target: &Path, relative: &Path, link: &Path) -> Result<(), OpError> {
    let result = if target.is_dir() {
        std::os::windows::fs::symlink_dir(relative, link)
    } else {
        std::os::windows::fs::symlink_file(relative, link)
    };
    result.map_err(|e| OpError::io(link, e))
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &Path, _relative: &Path, _link: &Path) -> Result<(), OpError> {
    Err(OpError::Unsupported { operation: "link" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/a/b/c.txt"), Path::new("/a/d")),
            PathBuf::from("../b/c.txt")
        );
        assert_eq!(
            relative_to(Path::new("/a/b"), Path::new("/a")),
            PathBuf::from("b")
        );
        assert_eq!(relative_to(Path::new("/a"), Path::new("/a")), PathBuf::from("."));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_link_is_relative() {
        let temp = tempfile::TempDir::new().unwrap();
        let target = temp.path().join("src/file.txt");
        std::fs::create_dir(temp.path().join("src")).unwrap();
        std::fs::write(&target, "t").unwrap();
        let at = temp.path().join("out/alias");

        link(target.clone(), at.clone()).await.unwrap();

        assert_eq!(
            std::fs::read_link(&at).unwrap(),
            PathBuf::from("../src/file.txt")
        );
        assert_eq!(std::fs::read_to_string(&at).unwrap(), "t");
    }
}
