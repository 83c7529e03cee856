//! Stat classification: raw metadata to semantic mode flags.

use std::fs::{self, DirEntry, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use sidetree_core::{Mode, ScanError};

/// Mode flags plus the resolved link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub mode: Mode,
    pub pointed: Option<PathBuf>,
}

impl Classified {
    fn orphan() -> Self {
        Self {
            mode: Mode::ORPHAN_LINK,
            pointed: None,
        }
    }
}

/// Classify a path without following a final symlink.
pub fn classify(path: &Path) -> Result<Classified, ScanError> {
    classify_with(path, fs::symlink_metadata(path))
}

/// Classify a directory entry from `read_dir`.
pub fn classify_entry(entry: &DirEntry) -> Result<Classified, ScanError> {
    // DirEntry::metadata does not traverse symlinks
    classify_with(&entry.path(), entry.metadata())
}

fn classify_with(path: &Path, info: io::Result<Metadata>) -> Result<Classified, ScanError> {
    let info = match info {
        Ok(info) => info,
        Err(err) => {
            let err = ScanError::io(path, err);
            return if err.is_degraded() {
                Ok(Classified::orphan())
            } else {
                Err(err)
            };
        }
    };

    if !info.file_type().is_symlink() {
        return Ok(Classified {
            mode: fs_modes(&info),
            pointed: None,
        });
    }

    // Strict resolution: missing targets, non-directories mid-path and cycles all fail here.
    let pointed = match fs::canonicalize(path) {
        Ok(pointed) => pointed,
        Err(_) => return Ok(Classified::orphan()),
    };
    match fs::symlink_metadata(&pointed) {
        Ok(link_info) => Ok(Classified {
            mode: fs_modes(&link_info) | Mode::LINK,
            pointed: Some(pointed),
        }),
        Err(_) => Ok(Classified::orphan()),
    }
}

#[cfg(unix)]
mod bits {
    pub const S_IFMT: u32 = 0o170000;
    pub const S_IFSOCK: u32 = 0o140000;
    pub const S_IFREG: u32 = 0o100000;
    pub const S_IFBLK: u32 = 0o060000;
    pub const S_IFDIR: u32 = 0o040000;
    pub const S_IFCHR: u32 = 0o020000;
    pub const S_IFIFO: u32 = 0o010000;
    #[cfg(any(target_os = "solaris", target_os = "illumos"))]
    pub const S_IFDOOR: u32 = 0o150000;

    pub const S_ISUID: u32 = 0o4000;
    pub const S_ISGID: u32 = 0o2000;
    pub const S_ISVTX: u32 = 0o1000;
    pub const S_IXUSR: u32 = 0o100;
    pub const S_IWOTH: u32 = 0o002;
}

/// Permission bits that each add an independent flag.
#[cfg(unix)]
const FILE_MODES: [(u32, Mode); 6] = [
    (bits::S_IXUSR, Mode::EXECUTABLE),
    (bits::S_ISGID, Mode::SET_GID),
    (bits::S_ISUID, Mode::SET_UID),
    (bits::S_ISVTX, Mode::STICKY),
    (bits::S_IWOTH, Mode::OTHER_WRITABLE),
    (bits::S_IWOTH | bits::S_ISVTX, Mode::STICKY_OTHER_WRITABLE),
];

/// Derive flags from metadata of a non-symlink.
#[cfg(unix)]
pub fn fs_modes(info: &Metadata) -> Mode {
    use std::os::unix::fs::MetadataExt;

    let st_mode = info.mode();
    let mut mode = match st_mode & bits::S_IFMT {
        bits::S_IFDIR => Mode::FOLDER,
        bits::S_IFREG => Mode::FILE,
        bits::S_IFIFO => Mode::PIPE,
        bits::S_IFSOCK => Mode::SOCKET,
        bits::S_IFCHR => Mode::CHAR_DEVICE,
        bits::S_IFBLK => Mode::BLOCK_DEVICE,
        _ => Mode::empty(),
    };

    #[cfg(any(target_os = "solaris", target_os = "illumos"))]
    if st_mode & bits::S_IFMT == bits::S_IFDOOR {
        mode |= Mode::DOOR;
    }

    if info.nlink() > 1 {
        mode |= Mode::MULTI_HARDLINK;
    }

    for (bit, flag) in FILE_MODES {
        if st_mode & bit == bit {
            mode |= flag;
        }
    }

    mode
}

#[cfg(not(unix))]
pub fn fs_modes(info: &Metadata) -> Mode {
    let file_type = info.file_type();
    if file_type.is_dir() {
        Mode::FOLDER
    } else if file_type.is_file() {
        Mode::FILE
    } else {
        Mode::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_regular_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        fs::write(&path, "hello").unwrap();

        let classified = classify(&path).unwrap();
        assert!(classified.mode.contains(Mode::FILE));
        assert!(!classified.mode.contains(Mode::FOLDER));
        assert!(classified.pointed.is_none());
    }

    #[test]
    fn test_directory() {
        let temp = TempDir::new().unwrap();
        let classified = classify(temp.path()).unwrap();
        assert!(classified.mode.is_folder());
    }

    #[test]
    fn test_missing_path_is_orphan() {
        let temp = TempDir::new().unwrap();
        let classified = classify(&temp.path().join("nope")).unwrap();
        assert_eq!(classified.mode, Mode::ORPHAN_LINK);
        assert!(classified.pointed.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target.txt");
        let link = temp.path().join("link");
        fs::write(&target, "x").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let classified = classify(&link).unwrap();
        assert!(classified.mode.contains(Mode::LINK));
        assert!(classified.mode.contains(Mode::FILE));
        assert!(!classified.mode.contains(Mode::FOLDER));
        assert_eq!(classified.pointed, Some(fs::canonicalize(&target).unwrap()));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_exactly_orphan() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("dangling");
        std::os::unix::fs::symlink(temp.path().join("missing"), &link).unwrap();

        let classified = classify(&link).unwrap();
        assert_eq!(classified.mode, Mode::ORPHAN_LINK);
        assert!(classified.pointed.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_is_orphan() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        std::os::unix::fs::symlink(&b, &a).unwrap();
        std::os::unix::fs::symlink(&a, &b).unwrap();

        assert_eq!(classify(&a).unwrap().mode, Mode::ORPHAN_LINK);
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_bits() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run.sh");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o757)).unwrap();

        let mode = classify(&path).unwrap().mode;
        assert!(mode.contains(Mode::FILE | Mode::EXECUTABLE | Mode::OTHER_WRITABLE));
        assert!(!mode.contains(Mode::STICKY));
        assert!(!mode.contains(Mode::STICKY_OTHER_WRITABLE));
    }

    #[cfg(unix)]
    #[test]
    fn test_hardlinks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("one");
        fs::write(&path, "x").unwrap();
        fs::hard_link(&path, temp.path().join("two")).unwrap();

        assert!(classify(&path).unwrap().mode.contains(Mode::MULTI_HARDLINK));
    }
}
