//! Filesystem walking engine for sidetree.
//!
//! This crate turns the filesystem into immutable [`Node`] trees and keeps
//! them current cheaply.
//!
//! # Overview
//!
//! - **Classification** of raw metadata into [`Mode`] flags, resolving symlinks
//! - **Fresh builds** gated by the expansion index
//! - **Incremental updates** that re-scan only invalidated directories and
//!   reuse every other subtree by reference
//! - **Off-thread execution** on a bounded rayon pool, awaited from async code
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::HashSet;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use sidetree_scan::{WalkExecutor, WalkOptions, build_fresh, update};
//!
//! # async fn demo() -> Result<(), sidetree_scan::WalkError> {
//! let executor = WalkExecutor::new(0)?;
//! let root = PathBuf::from("/path/to/project");
//! let index = Arc::new(HashSet::from([root.clone()]));
//! let options = WalkOptions::new(true, index);
//!
//! let tree = build_fresh(&executor, root.clone(), options.clone()).await?;
//! let tree = update(&executor, tree, options, HashSet::from([root])).await?;
//! println!("{} nodes", tree.len());
//! # Ok(())
//! # }
//! ```

mod cartographer;
mod classify;
mod executor;
mod progress;

pub use cartographer::{
    WalkOptions, YIELD_CADENCE, build_fresh, update, walk_fresh, walk_update,
};
pub use classify::{Classified, classify, classify_entry, fs_modes};
pub use executor::WalkExecutor;
pub use progress::WalkSummary;

// Re-export core types for convenience
pub use sidetree_core::{Children, Index, Mode, Node, NodeRef, ScanError, WalkError};
