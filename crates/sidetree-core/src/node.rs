//! Immutable filesystem node snapshots.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::mode::Mode;
use crate::paths;

/// Shared handle to an immutable node. Unchanged subtrees are reused by cloning this.
pub type NodeRef = Arc<Node>;

/// Children of a materialized directory, keyed by their absolute path.
pub type Children = BTreeMap<PathBuf, NodeRef>;

/// A single filesystem path as currently known.
///
/// Nodes are never edited in place: refreshing produces new values that
/// share untouched subtrees with the previous tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Absolute path, identity key.
    pub path: PathBuf,

    /// Semantic flags from the stat classifier.
    pub mode: Mode,

    /// Resolved target, present only for symlinks that resolved.
    pub pointed: Option<PathBuf>,

    /// Proper ancestors of `path`.
    #[serde(skip)]
    pub ancestors: Arc<HashSet<PathBuf>>,

    /// Materialized entries. Empty for collapsed or unexplored directories.
    pub children: Children,
}

impl Node {
    /// Create a node, computing its ancestor set.
    pub fn new(path: PathBuf, mode: Mode, pointed: Option<PathBuf>, children: Children) -> Self {
        let ancestors = Arc::new(paths::ancestors(&path));
        Self {
            path,
            mode,
            pointed,
            ancestors,
            children,
        }
    }

    /// Same entry with a different set of children.
    pub fn with_children(&self, children: Children) -> Self {
        Self {
            path: self.path.clone(),
            mode: self.mode,
            pointed: self.pointed.clone(),
            ancestors: Arc::clone(&self.ancestors),
            children,
        }
    }

    /// File name, or the full path for filesystem roots.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    /// Check if this node is a directory (or a link to one).
    pub fn is_dir(&self) -> bool {
        self.mode.is_folder()
    }

    /// Whether the node should behave as a directory.
    ///
    /// Links to directories count only when links are followed.
    pub fn act_like_dir(&self, follow_links: bool) -> bool {
        if self.pointed.is_some() && !follow_links {
            false
        } else {
            self.is_dir()
        }
    }

    /// Check if this node is hidden (dot-prefixed name).
    pub fn is_hidden(&self) -> bool {
        self.path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'))
    }

    /// Look up a descendant (or this node) by path.
    pub fn find(&self, path: &Path) -> Option<&Node> {
        if path == self.path {
            return Some(self);
        }
        if !path.starts_with(&self.path) {
            return None;
        }
        let relative = path.strip_prefix(&self.path).ok()?;
        let mut current = self;
        let mut cursor = self.path.clone();
        for component in relative.components() {
            cursor.push(component);
            current = current.children.get(&cursor)?;
        }
        Some(current)
    }

    /// Total number of materialized nodes, including this one.
    pub fn len(&self) -> usize {
        1 + self.children.values().map(|c| c.len()).sum::<usize>()
    }

    /// A node always counts itself.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Depth-first, pre-order iterator over this node and its materialized descendants.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }
}

/// Pre-order iterator returned by [`Node::iter`].
pub struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children.values().rev().map(|c| c.as_ref()));
        Some(node)
    }
}
