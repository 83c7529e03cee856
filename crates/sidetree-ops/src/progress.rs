//! Operation result types.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use sidetree_core::parents_of;

/// The type of operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Create,
    Rename,
    Link,
    Delete,
    Trash,
    ToggleExec,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "Create"),
            Self::Rename => write!(f, "Rename"),
            Self::Link => write!(f, "Link"),
            Self::Delete => write!(f, "Delete"),
            Self::Trash => write!(f, "Trash"),
            Self::ToggleExec => write!(f, "Toggle exec"),
        }
    }
}

/// Result of a completed operation.
#[derive(Debug, Clone)]
pub struct OperationComplete {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Paths that exist after the operation (created or renamed to).
    pub created: Vec<PathBuf>,
    /// Every path whose parent listing changed or whose metadata changed.
    pub touched: Vec<PathBuf>,
    /// Items that could not be processed.
    pub failed: usize,
}

impl OperationComplete {
    pub(crate) fn new(operation_type: OperationType) -> Self {
        Self {
            operation_type,
            created: Vec::new(),
            touched: Vec::new(),
            failed: 0,
        }
    }

    /// Directories whose listing must be re-scanned.
    pub fn invalidate_dirs(&self) -> HashSet<PathBuf> {
        parents_of(&self.touched)
    }

    /// Get a human-readable summary of the operation.
    pub fn summary(&self) -> String {
        let action = match self.operation_type {
            OperationType::Create => "Created",
            OperationType::Rename => "Renamed",
            OperationType::Link => "Linked",
            OperationType::Delete => "Deleted",
            OperationType::Trash => "Trashed",
            OperationType::ToggleExec => "Toggled exec on",
        };
        if self.failed == 0 {
            format!("{} {} items", action, self.touched.len())
        } else {
            format!("{} {}, failed {}", action, self.touched.len(), self.failed)
        }
    }
}
