//! Built-in command modules.
//!
//! Each handler reads the committed [`State`], performs its effect and
//! returns the next [`Stage`]. Filesystem-mutating handlers pass exactly the
//! parents of the paths they touched as invalidated directories.

mod focus;
mod fs;
mod index;
mod options;
mod refresh;
mod selection;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use sidetree_core::{Index, ancestors_of, is_relative_to};
use sidetree_ops::OperationComplete;

use crate::error::TransitionError;
use crate::state::{Stage, State};
use crate::transition::{CommandId, Context, Transition};

/// Every built-in handler.
pub(crate) fn all() -> Vec<Arc<dyn Transition>> {
    vec![
        Arc::new(refresh::ScheduledUpdate),
        Arc::new(refresh::Refresh),
        Arc::new(index::Open),
        Arc::new(index::Collapse),
        Arc::new(index::ToggleExpand),
        Arc::new(index::CollapseAll),
        Arc::new(index::FollowCurrent),
        Arc::new(index::ChangeRoot),
        Arc::new(selection::Select),
        Arc::new(selection::ClearSelection),
        Arc::new(options::Filter),
        Arc::new(options::ClearFilter),
        Arc::new(options::ToggleHidden),
        Arc::new(options::ToggleFollowLinks),
        Arc::new(options::Bigger),
        Arc::new(options::Smaller),
        Arc::new(focus::FocusGained),
        Arc::new(focus::SaveSession),
        Arc::new(fs::New),
        Arc::new(fs::Rename),
        Arc::new(fs::Link),
        Arc::new(fs::Delete),
        Arc::new(fs::Trash),
        Arc::new(fs::ToggleExec),
        Arc::new(fs::Stat),
    ]
}

/// `{ "path": ... }`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PathArgs {
    pub path: Option<PathBuf>,
}

impl PathArgs {
    pub fn require(self, command: CommandId) -> Result<PathBuf, TransitionError> {
        self.path
            .ok_or_else(|| TransitionError::args(command, "missing field `path`"))
    }
}

/// `{ "paths": [...] }`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PathsArgs {
    pub paths: Vec<PathBuf>,
}

/// The selection if there is one, otherwise the explicitly named paths.
pub(crate) fn targets(state: &State, explicit: Vec<PathBuf>) -> Vec<PathBuf> {
    if state.selection.is_empty() {
        explicit
    } else {
        let mut paths: Vec<PathBuf> = state.selection.iter().cloned().collect();
        paths.sort();
        paths
    }
}

/// The directory an entry at `path` stands for: itself if it acts like one, else its parent.
pub(crate) fn node_dir(state: &State, path: &Path) -> PathBuf {
    match state.root.find(path) {
        Some(node) if node.act_like_dir(state.follow_links) => path.to_path_buf(),
        _ => path
            .parent()
            .filter(|parent| state.contains(parent))
            .map(Path::to_path_buf)
            .unwrap_or_else(|| state.root.path.clone()),
    }
}

/// Index with the in-tree ancestors of `paths` added.
pub(crate) fn reveal<'a>(state: &State, paths: impl IntoIterator<Item = &'a PathBuf>) -> Index {
    let mut index = state.index.as_ref().clone();
    index.extend(
        ancestors_of(paths)
            .into_iter()
            .filter(|p| state.contains(p)),
    );
    index
}

/// Index without `removed` and anything below them.
pub(crate) fn prune(index: &Index, removed: &[PathBuf]) -> Index {
    index
        .iter()
        .filter(|p| !removed.iter().any(|r| is_relative_to(p, r)))
        .cloned()
        .collect()
}

/// Closest proper ancestor of `path` that is materialized in the tree.
fn listed_ancestor(state: &State, path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .skip(1)
        .find(|a| state.root.find(a).is_some())
        .map(Path::to_path_buf)
}

/// Fold a finished filesystem operation into the next stage.
///
/// Created paths are revealed and the first one focused; removed paths leave
/// the index; the selection is consumed.
pub(crate) async fn settle(
    state: &State,
    complete: OperationComplete,
    removed: bool,
    cx: &Context,
) -> Result<Stage, TransitionError> {
    tracing::info!("{}", complete.summary());
    let mut index = reveal(state, &complete.created);
    if removed {
        index = prune(&index, &complete.touched);
    }
    let focus = complete.created.iter().min().cloned();
    // Intermediate directories may be new too; their nearest listed ancestor must re-scan.
    let listed: Vec<PathBuf> = complete
        .created
        .iter()
        .filter_map(|p| listed_ancestor(state, p))
        .collect();

    let next = state
        .forward()
        .index(index)
        .selection(Default::default())
        .invalidate(complete.invalidate_dirs())
        .invalidate(listed)
        .apply(&cx.cancel)
        .await?;
    Ok(Stage::new(next).with_focus(focus))
}

#[cfg(test)]
pub(crate) mod fixture {
    use std::path::Path;

    use serde_json::Value;
    use tempfile::TempDir;

    use sidetree_core::Settings;
    use sidetree_scan::WalkExecutor;

    use crate::state::{Stage, State};
    use crate::transition::{CommandId, Context, Registry};

    /// A state rooted at `root`, with sessions kept inside `temp`.
    pub async fn state_at(temp: &TempDir, root: &Path) -> State {
        let settings = Settings::builder()
            .session_dir(Some(temp.path().join(".sessions")))
            .build()
            .unwrap();
        State::initial(settings, root.to_path_buf(), WalkExecutor::new(2).unwrap())
            .await
            .unwrap()
    }

    pub async fn run(state: &State, id: CommandId, args: Value) -> Option<Stage> {
        let registry = Registry::builtin();
        registry
            .get(id)
            .unwrap()
            .apply(state, &args, &Context::default())
            .await
            .unwrap()
    }
}
