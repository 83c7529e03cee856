//! Flattening a state into display rows.

use std::cmp::Ordering;
use std::path::PathBuf;

use globset::GlobMatcher;
use itertools::Itertools;
use serde::Serialize;

use sidetree_core::{Mode, Node};

use crate::state::State;

/// One visible line of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub depth: usize,
    pub path: PathBuf,
    pub name: String,
    pub mode: Mode,
    pub is_dir: bool,
    pub expanded: bool,
    pub selected: bool,
}

/// Depth-first rows, directories first, names compared case-insensitively.
///
/// Hidden and ignored entries are dropped. With a filter set, only entries
/// whose name matches remain, plus the directories leading to them.
pub fn rows(state: &State) -> Vec<Row> {
    let filter = state
        .filter_pattern
        .as_deref()
        .and_then(|p| globset::Glob::new(p).ok())
        .map(|g| g.compile_matcher());

    let walker = ViewWalker {
        state,
        filter: filter.as_ref(),
    };
    let mut out = Vec::new();
    walker.push(&state.root, 0, &mut out);
    out
}

struct ViewWalker<'a> {
    state: &'a State,
    filter: Option<&'a GlobMatcher>,
}

impl ViewWalker<'_> {
    fn push(&self, node: &Node, depth: usize, out: &mut Vec<Row>) {
        let is_dir = node.act_like_dir(self.state.follow_links);
        out.push(Row {
            depth,
            path: node.path.clone(),
            name: node.name(),
            mode: node.mode,
            is_dir,
            expanded: is_dir && self.state.index.contains(&node.path),
            selected: self.state.selection.contains(&node.path),
        });

        let follow_links = self.state.follow_links;
        for child in node
            .children
            .values()
            .filter(|c| self.visible(c))
            .sorted_by(|a, b| compare(a, b, follow_links))
        {
            self.push(child, depth + 1, out);
        }
    }

    fn visible(&self, node: &Node) -> bool {
        self.shown(node) && self.filter.is_none_or(|f| self.matches(node, f))
    }

    fn shown(&self, node: &Node) -> bool {
        (self.state.show_hidden || !node.is_hidden()) && !self.state.ignore.is_ignored(&node.path)
    }

    fn matches(&self, node: &Node, filter: &GlobMatcher) -> bool {
        filter.is_match(node.name())
            || node
                .children
                .values()
                .any(|c| self.shown(c) && self.matches(c, filter))
    }
}

fn compare(a: &Node, b: &Node, follow_links: bool) -> Ordering {
    let a_dir = a.act_like_dir(follow_links);
    let b_dir = b.act_like_dir(follow_links);
    b_dir
        .cmp(&a_dir)
        .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
        .then_with(|| a.path.cmp(&b.path))
}
