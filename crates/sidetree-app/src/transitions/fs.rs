//! Commands that mutate the filesystem.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{PathArgs, PathsArgs, node_dir, settle, targets};
use crate::error::TransitionError;
use crate::state::{Stage, State};
use crate::transition::{CommandId, Context, Transition, parse_args};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NameArgs {
    /// Entry the command was invoked on.
    path: Option<PathBuf>,
    name: String,
}

impl NameArgs {
    fn name(&self, command: CommandId) -> Result<&str, TransitionError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(TransitionError::args(command, "missing field `name`"));
        }
        Ok(name)
    }
}

/// Create a file, or a directory when the name ends with `/`.
pub(crate) struct New;

#[async_trait]
impl Transition for New {
    fn id(&self) -> CommandId {
        CommandId::New
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let args: NameArgs = parse_args(self.id(), args)?;
        let base = match &args.path {
            Some(path) => node_dir(state, path),
            None => state.root.path.clone(),
        };
        let (path, kind) = sidetree_ops::parse_new_entry(&base, args.name(self.id())?);
        let complete = sidetree_ops::create(path, kind).await?;
        settle(state, complete, false, cx).await.map(Some)
    }
}

/// Rename an entry. Relative names resolve against the entry's parent.
pub(crate) struct Rename;

#[async_trait]
impl Transition for Rename {
    fn id(&self) -> CommandId {
        CommandId::Rename
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let args: NameArgs = parse_args(self.id(), args)?;
        let name = args.name(self.id())?;
        let Some(source) = args.path.clone() else {
            return Err(TransitionError::args(self.id(), "missing field `path`"));
        };
        let parent = source.parent().map(PathBuf::from).unwrap_or_default();
        let dest = parent.join(name);

        let complete = sidetree_ops::rename(source.clone(), dest).await?;
        // The old path leaves the index; the new one is revealed.
        let index = super::prune(&state.index, std::slice::from_ref(&source));
        let mut pruned = state.clone();
        pruned.index = std::sync::Arc::new(index);
        settle(&pruned, complete, false, cx).await.map(Some)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LinkArgs {
    /// Entry to link to.
    path: Option<PathBuf>,
    /// Link name, relative to `dir`.
    name: String,
    /// Directory to place the link in; defaults to the target's parent.
    dir: Option<PathBuf>,
}

/// Create a relative symlink to an entry.
pub(crate) struct Link;

#[async_trait]
impl Transition for Link {
    fn id(&self) -> CommandId {
        CommandId::Link
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let LinkArgs { path, name, dir } = parse_args(self.id(), args)?;
        let Some(target) = path else {
            return Err(TransitionError::args(self.id(), "missing field `path`"));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(TransitionError::args(self.id(), "missing field `name`"));
        }
        let dir = match dir {
            Some(dir) => node_dir(state, &dir),
            None => target
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| state.root.path.clone()),
        };

        let complete = sidetree_ops::link(target, dir.join(name)).await?;
        settle(state, complete, false, cx).await.map(Some)
    }
}

/// Permanently delete the selection (or the named paths).
pub(crate) struct Delete;

#[async_trait]
impl Transition for Delete {
    fn id(&self) -> CommandId {
        CommandId::Delete
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let PathsArgs { paths } = parse_args(self.id(), args)?;
        let paths = removable(state, targets(state, paths));
        if paths.is_empty() {
            return Ok(None);
        }
        let complete = sidetree_ops::delete(paths).await?;
        settle(state, complete, true, cx).await.map(Some)
    }
}

/// Move the selection (or the named paths) to the trash.
pub(crate) struct Trash;

#[async_trait]
impl Transition for Trash {
    fn id(&self) -> CommandId {
        CommandId::Trash
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let PathsArgs { paths } = parse_args(self.id(), args)?;
        let paths = removable(state, targets(state, paths));
        if paths.is_empty() {
            return Ok(None);
        }
        let complete = sidetree_ops::trash(paths).await?;
        settle(state, complete, true, cx).await.map(Some)
    }
}

/// The tree root itself is never removed.
fn removable(state: &State, paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|p| state.contains(p) && *p != state.root.path)
        .collect()
}

pub(crate) struct ToggleExec;

#[async_trait]
impl Transition for ToggleExec {
    fn id(&self) -> CommandId {
        CommandId::ToggleExec
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let PathsArgs { paths } = parse_args(self.id(), args)?;
        let paths: Vec<PathBuf> = targets(state, paths)
            .into_iter()
            .filter(|p| state.contains(p))
            .filter(|p| {
                state
                    .root
                    .find(p)
                    .is_none_or(|node| !node.act_like_dir(state.follow_links))
            })
            .collect();
        let complete = sidetree_ops::toggle_exec(paths).await?;
        if complete.touched.is_empty() {
            return Ok(None);
        }
        settle(state, complete, false, cx).await.map(Some)
    }
}

/// Log a one-line stat of an entry. Never stages.
pub(crate) struct Stat;

#[async_trait]
impl Transition for Stat {
    fn id(&self) -> CommandId {
        CommandId::Stat
    }

    async fn apply(
        &self,
        _state: &State,
        args: &Value,
        _cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let path = parse_args::<PathArgs>(self.id(), args)?.require(self.id())?;
        let info = sidetree_ops::stat(path).await?;
        tracing::info!("{info}");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::super::fixture::{run, state_at};
    use crate::transition::CommandId;

    #[tokio::test]
    async fn test_new_file_is_revealed_and_focused() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        std::fs::create_dir(&work).unwrap();
        let state = state_at(&temp, &work).await;

        let stage = run(&state, CommandId::New, json!({ "name": "a/b/c.txt" })).await.unwrap();
        let created = work.join("a/b/c.txt");
        assert!(created.is_file());
        assert_eq!(stage.focus.as_ref(), Some(&created));
        assert!(stage.state.index.contains(&work.join("a/b")));
        assert!(stage.state.root.find(&created).is_some());
    }

    #[tokio::test]
    async fn test_new_directory_with_trailing_slash() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        std::fs::create_dir(&work).unwrap();
        let state = state_at(&temp, &work).await;

        run(&state, CommandId::New, json!({ "name": "pkg/" })).await.unwrap();
        assert!(work.join("pkg").is_dir());
    }

    #[tokio::test]
    async fn test_rename_updates_tree() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        std::fs::create_dir(&work).unwrap();
        std::fs::write(work.join("old.txt"), "o").unwrap();
        let state = state_at(&temp, &work).await;

        let stage = run(
            &state,
            CommandId::Rename,
            json!({ "path": work.join("old.txt"), "name": "new.txt" }),
        )
        .await
        .unwrap();

        assert!(stage.state.root.find(&work.join("old.txt")).is_none());
        assert!(stage.state.root.find(&work.join("new.txt")).is_some());
    }

    #[tokio::test]
    async fn test_delete_selection_prunes_index() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        let sub = work.join("sub");
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(sub.join("x"), "x").unwrap();
        let state = state_at(&temp, &work).await;
        let state = run(&state, CommandId::Open, json!({ "path": sub })).await.unwrap().state;
        let state = run(&state, CommandId::Select, json!({ "paths": [sub] })).await.unwrap().state;

        let stage = run(&state, CommandId::Delete, json!(null)).await.unwrap();
        assert!(!sub.exists());
        assert!(!stage.state.index.contains(&sub));
        assert!(stage.state.selection.is_empty());
        assert!(stage.state.root.children.is_empty());
    }

    #[tokio::test]
    async fn test_delete_never_removes_root() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        std::fs::create_dir(&work).unwrap();
        let state = state_at(&temp, &work).await;

        assert!(run(&state, CommandId::Delete, json!({ "paths": [work] })).await.is_none());
        assert!(work.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_link_and_toggle_exec() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        std::fs::create_dir(&work).unwrap();
        let script = work.join("run.sh");
        std::fs::write(&script, "#!/bin/sh").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o644)).unwrap();
        let state = state_at(&temp, &work).await;

        let stage = run(&state, CommandId::Link, json!({ "path": script, "name": "alias" }))
            .await
            .unwrap();
        let alias = stage.state.root.find(&work.join("alias")).unwrap();
        assert!(alias.mode.is_link());

        run(&stage.state, CommandId::ToggleExec, json!({ "paths": [script] }))
            .await
            .unwrap();
        let mode = std::fs::metadata(&script).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_toggle_exec_skips_paths_outside_root() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        std::fs::create_dir(&work).unwrap();
        let outside = temp.path().join("outside.sh");
        std::fs::write(&outside, "#!/bin/sh").unwrap();
        std::fs::set_permissions(&outside, std::fs::Permissions::from_mode(0o644)).unwrap();
        let state = state_at(&temp, &work).await;

        assert!(run(&state, CommandId::ToggleExec, json!({ "paths": [outside] })).await.is_none());
        let mode = std::fs::metadata(&outside).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[tokio::test]
    async fn test_stat_never_stages() {
        let temp = TempDir::new().unwrap();
        let state = state_at(&temp, temp.path()).await;
        assert!(run(&state, CommandId::Stat, json!({ "path": temp.path() })).await.is_none());
    }
}
