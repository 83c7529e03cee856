//! The transition contract and the command registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tokio_util::sync::CancellationToken;

use crate::error::TransitionError;
use crate::state::{Stage, State};

/// Stable identifier of a command, as sent by the host.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommandId {
    ScheduledUpdate,
    Refresh,
    Open,
    Collapse,
    ToggleExpand,
    CollapseAll,
    Select,
    ClearSelection,
    Filter,
    ClearFilter,
    ToggleHidden,
    ToggleFollowLinks,
    Bigger,
    Smaller,
    FocusGained,
    SaveSession,
    ChangeRoot,
    FollowCurrent,
    New,
    Rename,
    Link,
    Delete,
    Trash,
    ToggleExec,
    Stat,
}

/// Per-invocation context handed to a transition.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Cancelled when a newer event supersedes a transient transition.
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

/// One command's state transition: `State x args -> optional Stage`.
///
/// Returning `Ok(None)` means nothing changed and nothing is redrawn.
#[async_trait]
pub trait Transition: Send + Sync {
    /// The command this transition answers to.
    fn id(&self) -> CommandId;

    /// Compute the next stage. Must not touch shared state; the dispatcher commits.
    async fn apply(
        &self,
        state: &State,
        args: &Value,
        cx: &Context,
    ) -> Result<Option<Stage>, TransitionError>;
}

/// Decode transition arguments. `null` decodes as an empty object.
pub fn parse_args<T: DeserializeOwned>(command: CommandId, args: &Value) -> Result<T, TransitionError> {
    let value = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args.clone()
    };
    serde_json::from_value(value).map_err(|e| TransitionError::args(command, e.to_string()))
}

/// Fixed mapping from command identifier to handler, resolved once at startup.
#[derive(Clone, Default)]
pub struct Registry {
    handlers: HashMap<CommandId, Arc<dyn Transition>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in command.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for handler in crate::transitions::all() {
            registry.register(handler);
        }
        registry
    }

    /// Register a handler, replacing any previous one for the same id.
    pub fn register(&mut self, handler: Arc<dyn Transition>) {
        self.handlers.insert(handler.id(), handler);
    }

    pub fn get(&self, id: CommandId) -> Option<&Arc<dyn Transition>> {
        self.handlers.get(&id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
