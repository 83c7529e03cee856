//! Error types for the application layer.

use std::path::PathBuf;

use thiserror::Error;

use sidetree_core::{ConfigError, WalkError};
use sidetree_ops::OpError;

use crate::transition::CommandId;

/// Why a transition produced no stage. Logged and swallowed by the dispatcher.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// Arguments did not decode or were semantically invalid.
    #[error("Invalid arguments for {command}: {message}")]
    Args { command: CommandId, message: String },

    /// A filesystem mutation failed.
    #[error(transparent)]
    Op(#[from] OpError),

    /// A tree walk failed or was cancelled.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// Reading or writing the session blob failed.
    #[error("Session I/O failed at {path}: {source}")]
    Session {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The session blob could not be encoded.
    #[error("Session encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TransitionError {
    pub(crate) fn args(command: CommandId, message: impl Into<String>) -> Self {
        Self::Args {
            command,
            message: message.into(),
        }
    }

    /// Whether the transition was abandoned through its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Walk(err) if err.is_cancelled())
    }
}

/// A render attempt failed.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The host UI is temporarily unable to draw; retried immediately.
    #[error("Host UI unavailable: {0}")]
    Unavailable(String),

    /// Any other failure; logged without retry.
    #[error("Render failed: {0}")]
    Fatal(String),
}

/// Errors constructing or feeding the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The initial walk failed.
    #[error("Initial walk failed: {0}")]
    Walk(#[from] WalkError),

    /// The dispatcher has stopped accepting events.
    #[error("Event queue closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_walk_is_recognised() {
        assert!(TransitionError::from(WalkError::Cancelled).is_cancelled());
        assert!(!TransitionError::args(CommandId::Open, "missing path").is_cancelled());
    }

    #[test]
    fn test_args_display() {
        let err = TransitionError::args(CommandId::Rename, "missing field `name`");
        assert_eq!(
            err.to_string(),
            "Invalid arguments for rename: missing field `name`"
        );
    }
}
