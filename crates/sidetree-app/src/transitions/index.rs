//! Expansion index edits.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use sidetree_core::Index;
use sidetree_scan::{WalkOptions, build_fresh};

use super::{PathArgs, node_dir, prune, reveal};
use crate::error::TransitionError;
use crate::session::Session;
use crate::state::{Stage, State};
use crate::transition::{CommandId, Context, Transition, parse_args};

async fn expand(state: &State, path: PathBuf, cx: &Context) -> Result<Stage, TransitionError> {
    let mut index = state.index.as_ref().clone();
    index.insert(path.clone());
    let next = state
        .forward()
        .index(index)
        .invalidate([path.clone()])
        .apply(&cx.cancel)
        .await?;
    Ok(Stage::new(next).with_focus(Some(path)))
}

async fn collapse(state: &State, dir: PathBuf, cx: &Context) -> Result<Stage, TransitionError> {
    let index = prune(&state.index, std::slice::from_ref(&dir));
    let next = state
        .forward()
        .index(index)
        .invalidate([dir.clone()])
        .apply(&cx.cancel)
        .await?;
    Ok(Stage::new(next).with_focus(Some(dir)))
}

/// Expand a directory, or make a file the current one.
pub(crate) struct Open;

#[async_trait]
impl Transition for Open {
    fn id(&self) -> CommandId {
        CommandId::Open
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let path = parse_args::<PathArgs>(self.id(), args)?.require(self.id())?;
        let Some(node) = state.root.find(&path) else {
            return Err(TransitionError::args(self.id(), format!("{} is not in the tree", path.display())));
        };

        if node.act_like_dir(state.follow_links) {
            expand(state, path, cx).await.map(Some)
        } else {
            let next = state
                .forward()
                .current(Some(path.clone()))
                .apply(&cx.cancel)
                .await?;
            Ok(Some(Stage::new(next).with_focus(Some(path))))
        }
    }
}

/// Collapse a directory (or a file's parent), forgetting expanded descendants too.
pub(crate) struct Collapse;

#[async_trait]
impl Transition for Collapse {
    fn id(&self) -> CommandId {
        CommandId::Collapse
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let path = parse_args::<PathArgs>(self.id(), args)?.require(self.id())?;
        let dir = node_dir(state, &path);
        if !state.index.contains(&dir) {
            return Ok(None);
        }
        collapse(state, dir, cx).await.map(Some)
    }
}

pub(crate) struct ToggleExpand;

#[async_trait]
impl Transition for ToggleExpand {
    fn id(&self) -> CommandId {
        CommandId::ToggleExpand
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let path = parse_args::<PathArgs>(self.id(), args)?.require(self.id())?;
        let Some(node) = state.root.find(&path) else {
            return Ok(None);
        };
        if !node.act_like_dir(state.follow_links) {
            return Ok(None);
        }
        let stage = if state.index.contains(&path) {
            collapse(state, path, cx).await?
        } else {
            expand(state, path, cx).await?
        };
        Ok(Some(stage))
    }
}

/// Keep only the root expanded.
pub(crate) struct CollapseAll;

#[async_trait]
impl Transition for CollapseAll {
    fn id(&self) -> CommandId {
        CommandId::CollapseAll
    }

    async fn apply(
        &self,
        state: &State,
        _args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let root = state.root.path.clone();
        let next = state
            .forward()
            .index(Index::from([root.clone()]))
            .invalidate([root.clone()])
            .apply(&cx.cancel)
            .await?;
        Ok(Some(Stage::new(next).with_focus(Some(root))))
    }
}

/// Track the host's current file, revealing it when following is on.
pub(crate) struct FollowCurrent;

#[async_trait]
impl Transition for FollowCurrent {
    fn id(&self) -> CommandId {
        CommandId::FollowCurrent
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let path = parse_args::<PathArgs>(self.id(), args)?.require(self.id())?;
        if state.current.as_ref() == Some(&path) {
            return Ok(None);
        }
        let is_file = sidetree_ops::resolve(path.clone())
            .await?
            .is_some_and(|meta| meta.is_file());
        if !is_file {
            return Ok(None);
        }

        let forward = state.forward().current(Some(path.clone()));
        if !state.follow || !state.contains(&path) {
            return Ok(Some(Stage::new(forward.apply(&cx.cancel).await?)));
        }

        let index = reveal(state, [&path]);
        let added: Vec<PathBuf> = index.difference(&state.index).cloned().collect();
        let next = forward.index(index).invalidate(added).apply(&cx.cancel).await?;
        Ok(Some(Stage::new(next).with_focus(Some(path))))
    }
}

/// Re-root the tree at another directory.
pub(crate) struct ChangeRoot;

#[async_trait]
impl Transition for ChangeRoot {
    fn id(&self) -> CommandId {
        CommandId::ChangeRoot
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let path = parse_args::<PathArgs>(self.id(), args)?.require(self.id())?;
        let is_dir = sidetree_ops::resolve(path.clone())
            .await?
            .is_some_and(|meta| meta.is_dir());
        if !is_dir {
            return Err(TransitionError::args(self.id(), format!("{} is not a directory", path.display())));
        }

        let mut index = state.index.as_ref().clone();
        index.insert(path.clone());
        let index = Arc::new(index);
        let options = WalkOptions::new(state.follow_links, Arc::clone(&index))
            .with_cancel(cx.cancel.clone());
        let root = build_fresh(&state.executor, path.clone(), options).await?;

        let next = state
            .forward()
            .root(root)
            .index(index.as_ref().clone())
            .selection(Default::default())
            .session(Session::new(path.clone(), state.settings.session_storage()))
            .apply(&cx.cancel)
            .await?;
        Ok(Some(Stage::new(next).with_focus(Some(path)).grab_focus()))
    }
}
