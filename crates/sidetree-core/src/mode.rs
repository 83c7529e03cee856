//! Semantic mode flags derived from raw filesystem metadata.
//!
//! The flag vocabulary follows the classes `ls` colours by, so a renderer
//! can map each flag to a highlight group.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of semantic flags describing one filesystem entry.
    ///
    /// `FOLDER`, `FILE`, `PIPE`, `SOCKET`, `CHAR_DEVICE` and `BLOCK_DEVICE`
    /// are mutually exclusive primary kinds. Every other flag is additive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Mode: u32 {
        /// Stat failed, or a symlink whose target cannot be resolved.
        const ORPHAN_LINK = 1 << 0;
        /// Symlink with a resolvable target (the other flags describe the target).
        const LINK = 1 << 1;

        const PIPE = 1 << 2;
        const SOCKET = 1 << 3;
        const BLOCK_DEVICE = 1 << 4;
        const CHAR_DEVICE = 1 << 5;
        /// Solaris door.
        const DOOR = 1 << 6;

        const STICKY_OTHER_WRITABLE = 1 << 7;
        const OTHER_WRITABLE = 1 << 8;
        const STICKY = 1 << 9;
        const FOLDER = 1 << 10;

        const SET_UID = 1 << 11;
        const SET_GID = 1 << 12;
        /// File with capabilities. Never produced by the classifier; kept for renderers.
        const FILE_W_CAPACITY = 1 << 13;
        const EXECUTABLE = 1 << 14;
        /// Hard-link count greater than one.
        const MULTI_HARDLINK = 1 << 15;
        const FILE = 1 << 16;
    }
}

impl Mode {
    /// Check if this entry is a directory (or a link to one).
    pub fn is_folder(self) -> bool {
        self.contains(Mode::FOLDER)
    }

    /// Check if this entry is a regular file (or a link to one).
    pub fn is_file(self) -> bool {
        self.contains(Mode::FILE)
    }

    /// Check if this entry is a symlink with a resolvable target.
    pub fn is_link(self) -> bool {
        self.contains(Mode::LINK)
    }

    /// Check if this entry is an unresolvable link or failed to stat.
    pub fn is_orphan(self) -> bool {
        self.contains(Mode::ORPHAN_LINK)
    }

    /// Short lowercase names of every flag set, in declaration order.
    pub fn labels(self) -> Vec<&'static str> {
        self.iter_names()
            .map(|(name, _)| match name {
                "ORPHAN_LINK" => "orphan_link",
                "LINK" => "link",
                "PIPE" => "pipe",
                "SOCKET" => "socket",
                "BLOCK_DEVICE" => "block_device",
                "CHAR_DEVICE" => "char_device",
                "DOOR" => "door",
                "STICKY_OTHER_WRITABLE" => "sticky_other_writable",
                "OTHER_WRITABLE" => "other_writable",
                "STICKY" => "sticky",
                "FOLDER" => "folder",
                "SET_UID" => "set_uid",
                "SET_GID" => "set_gid",
                "FILE_W_CAPACITY" => "file_w_capacity",
                "EXECUTABLE" => "executable",
                "MULTI_HARDLINK" => "multi_hardlink",
                _ => "file",
            })
            .collect()
    }
}
