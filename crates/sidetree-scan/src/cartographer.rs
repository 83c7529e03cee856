//! Tree building and incremental refresh.
//!
//! Both entry points run on the [`WalkExecutor`] pool. A fresh build walks
//! from a root, recursing only into directories in the expansion index. An
//! incremental update walks an existing tree: subtrees at or below an
//! invalidated directory are rebuilt, the listings of their ancestors are
//! re-read, and everything else is reused by reference without touching disk.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use sidetree_core::{
    Children, Index, Node, NodeRef, ScanError, WalkError, cross_over, is_relative_to,
};

use crate::classify::{Classified, classify, classify_entry};
use crate::executor::WalkExecutor;
use crate::progress::{WalkSummary, WalkTracker};

/// Every this many visited nodes the walk checks for cancellation and yields its thread.
pub const YIELD_CADENCE: u64 = 17;

/// Parameters shared by every node of one walk.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Recurse into directories reached through symlinks.
    pub follow_links: bool,
    /// Directories to recurse into.
    pub index: Arc<Index>,
    /// Checked at safe points; a cancelled walk returns [`WalkError::Cancelled`].
    pub cancel: CancellationToken,
}

impl WalkOptions {
    /// Options with a fresh, never-cancelled token.
    pub fn new(follow_links: bool, index: Arc<Index>) -> Self {
        Self {
            follow_links,
            index,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Build a fresh tree from `root` on the executor.
pub async fn build_fresh(
    executor: &WalkExecutor,
    root: PathBuf,
    options: WalkOptions,
) -> Result<NodeRef, WalkError> {
    let (node, summary) = executor
        .submit(move || walk_fresh(&root, &options))
        .await?;
    tracing::debug!(
        visited = summary.visited,
        stat_calls = summary.stat_calls,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "fs->new"
    );
    Ok(node)
}

/// Refresh `root`, re-scanning only what `invalidate_dirs` covers.
///
/// Falls back to a fresh build when the root itself has vanished.
pub async fn update(
    executor: &WalkExecutor,
    root: NodeRef,
    options: WalkOptions,
    invalidate_dirs: HashSet<PathBuf>,
) -> Result<NodeRef, WalkError> {
    let path = root.path.clone();
    let job_options = options.clone();
    let result = executor
        .submit(move || walk_update(&root, &job_options, &invalidate_dirs))
        .await;

    match result {
        Ok((node, summary)) => {
            tracing::debug!(
                visited = summary.visited,
                stat_calls = summary.stat_calls,
                reused = summary.reused,
                elapsed_ms = summary.elapsed.as_millis() as u64,
                "fs->update"
            );
            Ok(node)
        }
        Err(WalkError::Scan(ScanError::NotFound { .. })) => {
            tracing::debug!(root = %path.display(), "root vanished, rebuilding");
            build_fresh(executor, path, options).await
        }
        Err(err) => Err(err),
    }
}

/// Blocking fresh build. Runs on the calling thread.
pub fn walk_fresh(root: &Path, options: &WalkOptions) -> Result<(NodeRef, WalkSummary), WalkError> {
    let walker = Walker::new(options);
    let node = walker.build_path(root)?;
    Ok((Arc::new(node), walker.tracker.snapshot()))
}

/// Blocking incremental update. Runs on the calling thread; children are refreshed
/// in parallel on the current rayon pool.
pub fn walk_update(
    root: &NodeRef,
    options: &WalkOptions,
    invalidate_dirs: &HashSet<PathBuf>,
) -> Result<(NodeRef, WalkSummary), WalkError> {
    if let Err(err) = fs::symlink_metadata(&root.path) {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Err(ScanError::io(&root.path, err).into());
        }
    }
    let walker = Walker::new(options);
    let node = walker.update(root, invalidate_dirs)?;
    Ok((node, walker.tracker.snapshot()))
}

struct Walker<'a> {
    options: &'a WalkOptions,
    tracker: WalkTracker,
}

impl<'a> Walker<'a> {
    fn new(options: &'a WalkOptions) -> Self {
        Self {
            options,
            tracker: WalkTracker::new(),
        }
    }

    /// Count a visit; at the cadence, honour cancellation and let other threads run.
    fn tick(&self) -> Result<(), WalkError> {
        if self.tracker.visit() % YIELD_CADENCE == 0 {
            if self.options.cancel.is_cancelled() {
                return Err(WalkError::Cancelled);
            }
            std::thread::yield_now();
        }
        Ok(())
    }

    fn build_path(&self, path: &Path) -> Result<Node, WalkError> {
        self.tick()?;
        self.tracker.record_stat();
        let classified = classify(path)?;
        self.build(path.to_path_buf(), classified)
    }

    fn build(&self, path: PathBuf, classified: Classified) -> Result<Node, WalkError> {
        let expand = self.expands(&path, &classified);
        let Classified { mode, pointed } = classified;

        let children = if expand {
            self.scan_dir(&path)?
        } else {
            Children::new()
        };
        Ok(Node::new(path, mode, pointed, children))
    }

    fn expands(&self, path: &Path, classified: &Classified) -> bool {
        classified.mode.is_folder()
            && self.options.index.contains(path)
            && (self.options.follow_links || classified.pointed.is_none())
    }

    fn scan_dir(&self, dir: &Path) -> Result<Children, WalkError> {
        let mut children = Children::new();
        for (path, classified) in self.list(dir)? {
            let node = self.build(path, classified)?;
            children.insert(node.path.clone(), Arc::new(node));
        }
        Ok(children)
    }

    /// Classified entries of `dir`. Entries that vanish or are unreadable mid-listing are dropped.
    fn list(&self, dir: &Path) -> Result<Vec<(PathBuf, Classified)>, WalkError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "listing skipped");
                return Ok(Vec::new());
            }
        };

        let mut listed = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else { continue };
            self.tick()?;
            self.tracker.record_stat();
            match classify_entry(&entry) {
                Ok(classified) => listed.push((entry.path(), classified)),
                Err(err) => tracing::debug!(error = %err, "entry skipped"),
            }
        }
        Ok(listed)
    }

    fn update(&self, root: &NodeRef, invalidate_dirs: &HashSet<PathBuf>) -> Result<NodeRef, WalkError> {
        self.tick()?;

        if !invalidate_dirs.iter().any(|dir| cross_over(&root.path, dir)) {
            self.tracker.record_reuse();
            return Ok(Arc::clone(root));
        }

        if invalidate_dirs.iter().any(|dir| is_relative_to(&root.path, dir)) {
            return self.build_path(&root.path).map(Arc::new);
        }

        self.relist(root, invalidate_dirs)
    }

    /// Refresh a strict ancestor of an invalidated directory.
    ///
    /// The listing is re-read so it matches a fresh build. Entries whose
    /// classification is unchanged are updated from their cached node; new or
    /// changed entries are built fresh and vanished ones drop out.
    fn relist(&self, root: &NodeRef, invalidate_dirs: &HashSet<PathBuf>) -> Result<NodeRef, WalkError> {
        self.tracker.record_stat();
        let classified = classify(&root.path)?;
        if !self.expands(&root.path, &classified) {
            return self.build(root.path.clone(), classified).map(Arc::new);
        }

        let children = self
            .list(&root.path)?
            .into_par_iter()
            .map(|(path, entry)| {
                let node = match root.children.get(&path) {
                    Some(cached) if cached.mode == entry.mode && cached.pointed == entry.pointed => {
                        self.update(cached, invalidate_dirs)?
                    }
                    _ => Arc::new(self.build(path.clone(), entry)?),
                };
                Ok::<_, WalkError>((path, node))
            })
            .collect::<Result<Children, WalkError>>()?;
        Ok(Arc::new(Node::new(
            root.path.clone(),
            classified.mode,
            classified.pointed,
            children,
        )))
    }
}
