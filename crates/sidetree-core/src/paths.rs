//! Path relations used by the tree model and its invalidation logic.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Set of directories marked expanded.
pub type Index = HashSet<PathBuf>;

/// Set of paths selected by the user.
pub type Selection = HashSet<PathBuf>;

/// All proper ancestors of `path`, excluding `path` itself.
pub fn ancestors(path: &Path) -> HashSet<PathBuf> {
    path.ancestors().skip(1).map(Path::to_path_buf).collect()
}

/// Union of the proper ancestors of every path.
pub fn ancestors_of<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> HashSet<PathBuf> {
    paths
        .into_iter()
        .flat_map(|p| p.ancestors().skip(1).map(Path::to_path_buf))
        .collect()
}

/// Component-wise "`path` equals or is below `base`".
pub fn is_relative_to(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

/// Whether either path is an ancestor-or-equal of the other.
pub fn cross_over(root: &Path, invalid: &Path) -> bool {
    is_relative_to(root, invalid) || is_relative_to(invalid, root)
}

/// Parent directories of every path. Roots without a parent are skipped.
pub fn parents_of<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> HashSet<PathBuf> {
    paths
        .into_iter()
        .filter_map(|p| p.parent().map(Path::to_path_buf))
        .collect()
}
