//! View options: filter, hidden entries, link following and width.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::TransitionError;
use crate::state::{Stage, State};
use crate::transition::{CommandId, Context, Transition, parse_args};

/// Width change per resize step.
const RESIZE_STEP: usize = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilterArgs {
    pattern: String,
}

/// Show only entries whose name matches a glob.
pub(crate) struct Filter;

#[async_trait]
impl Transition for Filter {
    fn id(&self) -> CommandId {
        CommandId::Filter
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let FilterArgs { pattern } = parse_args(self.id(), args)?;
        let pattern = pattern.trim();
        let pattern = if pattern.is_empty() {
            None
        } else {
            globset::Glob::new(pattern)
                .map_err(|e| TransitionError::args(self.id(), e.to_string()))?;
            Some(pattern.to_string())
        };

        let next = state
            .forward()
            .filter_pattern(pattern)
            .apply(&cx.cancel)
            .await?;
        Ok(Some(Stage::new(next).with_focus(state.current.clone())))
    }
}

pub(crate) struct ClearFilter;

#[async_trait]
impl Transition for ClearFilter {
    fn id(&self) -> CommandId {
        CommandId::ClearFilter
    }

    async fn apply(
        &self,
        state: &State,
        _args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        if state.filter_pattern.is_none() {
            return Ok(None);
        }
        let next = state.forward().filter_pattern(None).apply(&cx.cancel).await?;
        Ok(Some(Stage::new(next)))
    }
}

pub(crate) struct ToggleHidden;

#[async_trait]
impl Transition for ToggleHidden {
    fn id(&self) -> CommandId {
        CommandId::ToggleHidden
    }

    async fn apply(
        &self,
        state: &State,
        _args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let next = state
            .forward()
            .show_hidden(!state.show_hidden)
            .apply(&cx.cancel)
            .await?;
        Ok(Some(Stage::new(next)))
    }
}

/// Flip link following; linked directories change shape, so the whole tree is re-walked.
pub(crate) struct ToggleFollowLinks;

#[async_trait]
impl Transition for ToggleFollowLinks {
    fn id(&self) -> CommandId {
        CommandId::ToggleFollowLinks
    }

    async fn apply(
        &self,
        state: &State,
        _args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let next = state
            .forward()
            .follow_links(!state.follow_links)
            .invalidate([state.root.path.clone()])
            .apply(&cx.cancel)
            .await?;
        Ok(Some(Stage::new(next)))
    }
}

async fn resize(state: &State, width: usize, cx: &Context) -> Result<Option<Stage>, TransitionError> {
    let width = width.max(1);
    if width == state.width {
        return Ok(None);
    }
    let next = state.forward().width(width).apply(&cx.cancel).await?;
    Ok(Some(Stage::new(next)))
}

pub(crate) struct Bigger;

#[async_trait]
impl Transition for Bigger {
    fn id(&self) -> CommandId {
        CommandId::Bigger
    }

    async fn apply(
        &self,
        state: &State,
        _args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        resize(state, state.width.saturating_add(RESIZE_STEP), cx).await
    }
}

pub(crate) struct Smaller;

#[async_trait]
impl Transition for Smaller {
    fn id(&self) -> CommandId {
        CommandId::Smaller
    }

    async fn apply(
        &self,
        state: &State,
        _args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        resize(state, state.width.saturating_sub(RESIZE_STEP), cx).await
    }
}
