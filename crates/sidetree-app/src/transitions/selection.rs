//! Selection edits.

use async_trait::async_trait;
use serde_json::Value;

use super::PathsArgs;
use crate::error::TransitionError;
use crate::state::{Stage, State};
use crate::transition::{CommandId, Context, Transition, parse_args};

/// Toggle each named path in or out of the selection.
pub(crate) struct Select;

#[async_trait]
impl Transition for Select {
    fn id(&self) -> CommandId {
        CommandId::Select
    }

    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        let PathsArgs { paths } = parse_args(self.id(), args)?;
        let mut selection = state.selection.clone();
        for path in paths.into_iter().filter(|p| state.contains(p)) {
            if !selection.remove(&path) {
                selection.insert(path);
            }
        }
        if selection == state.selection {
            return Ok(None);
        }
        let next = state.forward().selection(selection).apply(&cx.cancel).await?;
        Ok(Some(Stage::new(next)))
    }
}

pub(crate) struct ClearSelection;

#[async_trait]
impl Transition for ClearSelection {
    fn id(&self) -> CommandId {
        CommandId::ClearSelection
    }

    async fn apply(
        &self,
        state: &State,
        _args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError> {
        if state.selection.is_empty() {
            return Ok(None);
        }
        let next = state
            .forward()
            .selection(Default::default())
            .apply(&cx.cancel)
            .await?;
        Ok(Some(Stage::new(next)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::super::fixture::{run, state_at};
    use crate::transition::CommandId;

    #[tokio::test]
    async fn test_select_toggles_and_clears() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        let state = state_at(&temp, temp.path()).await;

        let stage = run(&state, CommandId::Select, json!({ "paths": [a, b] })).await.unwrap();
        assert_eq!(stage.state.selection.len(), 2);

        let stage = run(&stage.state, CommandId::Select, json!({ "paths": [a] })).await.unwrap();
        assert!(!stage.state.selection.contains(&a));
        assert!(stage.state.selection.contains(&b));

        let stage = run(&stage.state, CommandId::ClearSelection, json!(null)).await.unwrap();
        assert!(stage.state.selection.is_empty());
        assert!(run(&stage.state, CommandId::ClearSelection, json!(null)).await.is_none());
    }

    #[tokio::test]
    async fn test_paths_outside_root_ignored() {
        let temp = TempDir::new().unwrap();
        let state = state_at(&temp, temp.path()).await;
        assert!(
            run(&state, CommandId::Select, json!({ "paths": ["/definitely/elsewhere"] }))
                .await
                .is_none()
        );
    }
}
