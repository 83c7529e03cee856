//! The event queue feeding the dispatcher.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::transition::CommandId;

/// How the dispatcher treats an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// Runs to completion before the next event is dequeued.
    Sync,
    /// Cancelled and discarded if another event arrives before it finishes.
    Transient,
}

/// A queued command invocation.
#[derive(Debug, Clone)]
pub struct Event {
    pub class: EventClass,
    pub command: CommandId,
    pub args: Value,
}

impl Event {
    pub fn sync(command: CommandId, args: Value) -> Self {
        Self {
            class: EventClass::Sync,
            command,
            args,
        }
    }

    pub fn transient(command: CommandId, args: Value) -> Self {
        Self {
            class: EventClass::Transient,
            command,
            args,
        }
    }
}

/// Producer half of the queue. Cheap to clone; one per host, ticker, test.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
}

/// Consumer half, owned by the dispatcher.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Create a connected queue.
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

impl EventSender {
    pub fn send(&self, event: Event) -> Result<(), EngineError> {
        self.tx.send(event).map_err(|_| EngineError::Closed)
    }

    pub fn sync(&self, command: CommandId, args: Value) -> Result<(), EngineError> {
        self.send(Event::sync(command, args))
    }

    pub fn transient(&self, command: CommandId, args: Value) -> Result<(), EngineError> {
        self.send(Event::transient(command, args))
    }
}
