//! Host focus tracking and session saving.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransitionError;
use crate::session;
use crate::state::{Stage, State};
use crate::transition::{CommandId, Context, Transition};

pub(crate) struct FocusGained;

#[async_trait]
impl Transition for FocusGained {
    fn id(&self) -> CommandId {
        CommandId::FocusGained
    }

    async fn apply(
        &self,
        state: &State,
        _args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let next = state.forward().host_focus(true).apply(&cx.cancel).await?;
        Ok(Some(Stage::new(next)))
    }
}

/// Fired when the host loses focus or exits: persist the session, stop polling.
pub(crate) struct SaveSession;

#[async_trait]
impl Transition for SaveSession {
    fn id(&self) -> CommandId {
        CommandId::SaveSession
    }

    async fn apply(
        &self,
        state: &State,
        _args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        if state.settings.session {
            session::dump(state).await?;
        }
        let next = state.forward().host_focus(false).apply(&cx.cancel).await?;
        Ok(Some(Stage::new(next)))
    }
}
