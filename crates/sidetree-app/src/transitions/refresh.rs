//! Re-walks of the whole tree.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::TransitionError;
use crate::state::{Stage, State};
use crate::transition::{CommandId, Context, Transition, parse_args};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateArgs {
    force: bool,
}

/// Background poll. Stages only when the tree changed, unless forced.
pub(crate) struct ScheduledUpdate;

#[async_trait]
impl Transition for ScheduledUpdate {
    fn id(&self) -> CommandId {
        CommandId::ScheduledUpdate
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let UpdateArgs { force } = parse_args(self.id(), args)?;
        if !force && !state.host_focus {
            return Ok(None);
        }

        let next = state
            .forward()
            .invalidate([state.root.path.clone()])
            .apply(&cx.cancel)
            .await?;

        if !force && next.root == state.root {
            return Ok(None);
        }
        Ok(Some(Stage::new(next)))
    }
}

/// Explicit full refresh; also drops selected paths that no longer exist.
pub(crate) struct Refresh;

#[async_trait]
impl Transition for Refresh {
    fn id(&self) -> CommandId {
        CommandId::Refresh
    }

    async fn apply(
        &self,
        state: &State,
        _args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let selected = state.selection.iter().cloned().collect();
        let selection = sidetree_ops::existing(selected).await?.into_iter().collect();

        let next = state
            .forward()
            .selection(selection)
            .invalidate([state.root.path.clone()])
            .apply(&cx.cancel)
            .await?;
        let focus = next.current.clone();
        Ok(Some(Stage::new(next).with_focus(focus)))
    }
}
