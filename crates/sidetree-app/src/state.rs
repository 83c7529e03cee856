//! The state snapshot passed between transitions.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use sidetree_core::{IgnoreMatcher, Index, NodeRef, Selection, Settings, WalkError};
use sidetree_scan::{WalkExecutor, WalkOptions, build_fresh, update};

use crate::error::EngineError;
use crate::session::{self, Session};

/// Everything a transition reads. Replaced wholesale on commit, never mutated in place.
#[derive(Debug, Clone)]
pub struct State {
    pub executor: WalkExecutor,
    pub settings: Arc<Settings>,
    pub ignore: Arc<IgnoreMatcher>,
    pub session: Session,
    /// Whether the host window currently has focus.
    pub host_focus: bool,
    /// File the host is currently showing.
    pub current: Option<PathBuf>,
    pub filter_pattern: Option<String>,
    pub follow: bool,
    pub follow_links: bool,
    pub index: Arc<Index>,
    pub root: NodeRef,
    pub selection: Selection,
    pub show_hidden: bool,
    pub width: usize,
}

impl State {
    /// Walk `workdir` once, seeded by the stored session if enabled.
    pub async fn initial(
        settings: Settings,
        workdir: PathBuf,
        executor: WalkExecutor,
    ) -> Result<Self, EngineError> {
        let ignore = settings.ignore.compile()?;
        let session = Session::new(workdir.clone(), settings.session_storage());
        let stored = if settings.session {
            session::load(&session).await
        } else {
            None
        };

        let mut index = Index::from([workdir.clone()]);
        let mut show_hidden = settings.show_hidden;
        if let Some(stored) = stored {
            index.extend(stored.index);
            show_hidden = stored.show_hidden.unwrap_or(show_hidden);
        }
        let index = Arc::new(index);

        let options = WalkOptions::new(settings.follow_links, Arc::clone(&index));
        let root = build_fresh(&executor, workdir, options).await?;

        Ok(Self {
            executor,
            ignore: Arc::new(ignore),
            session,
            host_focus: true,
            current: None,
            filter_pattern: None,
            follow: settings.follow,
            follow_links: settings.follow_links,
            index,
            root,
            selection: Selection::new(),
            show_hidden,
            width: settings.width,
            settings: Arc::new(settings),
        })
    }

    /// Start a functional update of this state.
    pub fn forward(&self) -> Forward<'_> {
        Forward {
            base: self,
            state: self.clone(),
            root: None,
            invalidate_dirs: None,
        }
    }

    /// Whether `path` is inside the tree's root.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root.path)
    }
}

/// Builder for the next [`State`]. Fields left unset keep their current value.
///
/// When invalidated directories are given, the tree is refreshed on the walk
/// executor with the new index and link policy before the state is produced.
#[must_use]
pub struct Forward<'a> {
    base: &'a State,
    state: State,
    root: Option<NodeRef>,
    invalidate_dirs: Option<HashSet<PathBuf>>,
}

impl Forward<'_> {
    pub fn root(mut self, root: NodeRef) -> Self {
        self.root = Some(root);
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.state.index = Arc::new(index);
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.state.selection = selection;
        self
    }

    pub fn filter_pattern(mut self, pattern: Option<String>) -> Self {
        self.state.filter_pattern = pattern;
        self
    }

    pub fn show_hidden(mut self, show_hidden: bool) -> Self {
        self.state.show_hidden = show_hidden;
        self
    }

    pub fn follow(mut self, follow: bool) -> Self {
        self.state.follow = follow;
        self
    }

    pub fn follow_links(mut self, follow_links: bool) -> Self {
        self.state.follow_links = follow_links;
        self
    }

    pub fn width(mut self, width: usize) -> Self {
        self.state.width = width;
        self
    }

    pub fn current(mut self, current: Option<PathBuf>) -> Self {
        self.state.current = current;
        self
    }

    pub fn host_focus(mut self, focus: bool) -> Self {
        self.state.host_focus = focus;
        self
    }

    pub fn session(mut self, session: Session) -> Self {
        self.state.session = session;
        self
    }

    /// Directories to re-scan. Merged with any earlier call.
    pub fn invalidate(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.invalidate_dirs.get_or_insert_with(HashSet::new).extend(dirs);
        self
    }

    /// Produce the next state, refreshing the tree if anything was invalidated.
    pub async fn apply(self, cancel: &CancellationToken) -> Result<State, WalkError> {
        let Forward {
            base,
            mut state,
            root,
            invalidate_dirs,
        } = self;

        state.root = match (root, invalidate_dirs) {
            (Some(root), _) => root,
            (None, Some(dirs)) => {
                let options = WalkOptions::new(state.follow_links, Arc::clone(&state.index))
                    .with_cancel(cancel.clone());
                update(&state.executor, Arc::clone(&base.root), options, dirs).await?
            }
            (None, None) => Arc::clone(&base.root),
        };
        Ok(state)
    }
}

/// A transition's result: the next state plus a cursor hint.
#[derive(Debug, Clone)]
pub struct Stage {
    pub state: State,
    /// Path to place the cursor on.
    pub focus: Option<PathBuf>,
    /// Whether the host should move focus to the tree.
    pub grab_focus: bool,
}

impl Stage {
    pub fn new(state: State) -> Self {
        Self {
            state,
            focus: None,
            grab_focus: false,
        }
    }

    pub fn with_focus(mut self, focus: Option<PathBuf>) -> Self {
        self.focus = focus;
        self
    }

    pub fn grab_focus(mut self) -> Self {
        self.grab_focus = true;
        self
    }
}
