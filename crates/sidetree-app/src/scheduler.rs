//! The dispatcher: serializes transitions through one mutation lock.
//!
//! Sync events run to completion before the next event is dequeued. A
//! transient event runs in the background; if another event arrives before
//! it finishes, it is cancelled and whatever it computed is discarded.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::queue::{Event, EventClass, EventReceiver};
use crate::state::{Stage, State};
use crate::transition::{CommandId, Context, Registry};

/// Latest committed stage, shared with the redraw gate.
pub type Staged = watch::Receiver<Option<Arc<Stage>>>;

/// Runs transitions and commits their stages.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    state: Arc<Mutex<State>>,
    staged: Arc<watch::Sender<Option<Arc<Stage>>>>,
}

/// The one outstanding transient transition.
struct Running {
    command: CommandId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Running {
    async fn cancel(self) {
        let started = Instant::now();
        self.cancel.cancel();
        self.handle.abort();
        let _ = self.handle.await;
        tracing::debug!(
            command = %self.command,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transient cancelled"
        );
    }
}

enum Wake {
    Shutdown,
    Finished,
    Event(Option<Event>),
}

impl Dispatcher {
    /// Create a dispatcher owning `state`, plus a receiver of committed stages.
    pub fn new(registry: Registry, state: State) -> (Self, Staged) {
        let (tx, rx) = watch::channel(None);
        let dispatcher = Self {
            registry: Arc::new(registry),
            state: Arc::new(Mutex::new(state)),
            staged: Arc::new(tx),
        };
        (dispatcher, rx)
    }

    /// Another receiver of committed stages.
    pub fn subscribe(&self) -> Staged {
        self.staged.subscribe()
    }

    /// Process events until the queue closes or `shutdown` fires.
    pub async fn run(self, mut events: EventReceiver, shutdown: CancellationToken) {
        let mut transient: Option<Running> = None;

        loop {
            let wake = match transient.as_mut() {
                Some(running) => tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => Wake::Shutdown,
                    _ = &mut running.handle => Wake::Finished,
                    event = events.recv() => Wake::Event(event),
                },
                None => tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => Wake::Shutdown,
                    event = events.recv() => Wake::Event(event),
                },
            };

            let event = match wake {
                Wake::Shutdown | Wake::Event(None) => break,
                Wake::Finished => {
                    transient = None;
                    continue;
                }
                Wake::Event(Some(event)) => event,
            };

            // Newer intent wins over stale background work.
            if let Some(running) = transient.take() {
                running.cancel().await;
            }

            match event.class {
                EventClass::Sync => self.step(event, CancellationToken::new()).await,
                EventClass::Transient => {
                    let cancel = CancellationToken::new();
                    let command = event.command;
                    let this = self.clone();
                    let token = cancel.clone();
                    let handle = tokio::spawn(async move { this.step(event, token).await });
                    transient = Some(Running {
                        command,
                        cancel,
                        handle,
                    });
                }
            }
        }

        if let Some(running) = transient.take() {
            running.cancel().await;
        }
        tracing::debug!("dispatcher stopped");
    }

    /// Run one transition under the mutation lock and commit its stage.
    ///
    /// Every failure, panics included, is logged and the command dropped.
    async fn step(&self, event: Event, cancel: CancellationToken) {
        let Event { command, args, .. } = event;
        let Some(handler) = self.registry.get(command).cloned() else {
            tracing::warn!(%command, "no handler registered");
            return;
        };

        let mut state = self.state.lock().await;
        let cx = Context::new(cancel.clone());
        let started = Instant::now();
        let outcome = AssertUnwindSafe(handler.apply(&state, &args, &cx))
            .catch_unwind()
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(Some(stage))) if !cancel.is_cancelled() => {
                *state = stage.state.clone();
                self.staged.send_replace(Some(Arc::new(stage)));
                tracing::debug!(%command, elapsed_ms, "committed");
            }
            Ok(Ok(Some(_))) => tracing::debug!(%command, "discarded after cancellation"),
            Ok(Ok(None)) => tracing::debug!(%command, elapsed_ms, "no change"),
            Ok(Err(err)) if err.is_cancelled() => {
                tracing::debug!(%command, "abandoned");
            }
            Ok(Err(err)) => tracing::warn!(%command, error = %err, "transition failed"),
            Err(payload) => tracing::warn!(
                %command,
                message = panic_message(payload.as_ref()),
                "transition panicked"
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use super::*;
    use crate::error::TransitionError;
    use crate::queue::channel;
    use crate::transition::Transition;
    use crate::transitions::fixture::state_at;

    /// Sets the width from `{"width": n, "delay_ms": m}` after sleeping.
    struct SetWidth {
        id: CommandId,
        started: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transition for SetWidth {
        fn id(&self) -> CommandId {
            self.id
        }

        async fn apply(
            &self,
            state: &State,
            args: &Value,
            cx: &Context,
        ) -> Result<Option<Stage>, TransitionError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let delay = args["delay_ms"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let width = args["width"].as_u64().unwrap_or(0) as usize;
            let next = state.forward().width(width).apply(&cx.cancel).await?;
            Ok(Some(Stage::new(next)))
        }
    }

    struct Explode;

    #[async_trait]
    impl Transition for Explode {
        fn id(&self) -> CommandId {
            CommandId::Stat
        }

        async fn apply(
            &self,
            _state: &State,
            args: &Value,
            _cx: &Context,
        ) -> Result<Option<Stage>, TransitionError> {
            if args["panic"].as_bool().unwrap_or(false) {
                panic!("boom");
            }
            Err(TransitionError::args(CommandId::Stat, "always fails"))
        }
    }

    struct Harness {
        _temp: TempDir,
        tx: crate::queue::EventSender,
        widths: Arc<std::sync::Mutex<Vec<usize>>>,
        staged: Staged,
        shutdown: CancellationToken,
        started: Arc<AtomicUsize>,
        task: JoinHandle<()>,
    }

    async fn harness() -> Harness {
        let temp = TempDir::new().unwrap();
        let state = state_at(&temp, temp.path()).await;
        let started = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();
        for id in [CommandId::Bigger, CommandId::ScheduledUpdate] {
            registry.register(Arc::new(SetWidth {
                id,
                started: Arc::clone(&started),
            }));
        }
        registry.register(Arc::new(Explode));

        let (dispatcher, staged) = Dispatcher::new(registry, state);
        let (tx, rx) = channel();
        let shutdown = CancellationToken::new();

        let widths = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut watcher = dispatcher.subscribe();
        let seen = Arc::clone(&widths);
        tokio::spawn(async move {
            while watcher.changed().await.is_ok() {
                if let Some(stage) = watcher.borrow_and_update().clone() {
                    seen.lock().unwrap().push(stage.state.width);
                }
            }
        });

        let task = tokio::spawn(dispatcher.run(rx, shutdown.clone()));
        Harness {
            _temp: temp,
            tx,
            widths,
            staged,
            shutdown,
            started,
            task,
        }
    }

    fn latest_width(staged: &Staged) -> Option<usize> {
        staged.borrow().as_ref().map(|s| s.state.width)
    }

    #[tokio::test]
    async fn test_sync_then_transient_both_visible() {
        let h = harness().await;
        h.tx.sync(CommandId::Bigger, json!({"width": 7, "delay_ms": 20}))
            .unwrap();
        h.tx.transient(CommandId::ScheduledUpdate, json!({"width": 9}))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(latest_width(&h.staged), Some(9));
        assert!(!h.widths.lock().unwrap().is_empty());

        h.shutdown.cancel();
        h.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_superseded_transient_never_commits() {
        let h = harness().await;
        h.tx.transient(
            CommandId::ScheduledUpdate,
            json!({"width": 111, "delay_ms": 400}),
        )
        .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.tx.transient(CommandId::ScheduledUpdate, json!({"width": 222}))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(h.started.load(Ordering::SeqCst), 2);
        assert_eq!(latest_width(&h.staged), Some(222));
        assert!(!h.widths.lock().unwrap().contains(&111));

        h.shutdown.cancel();
        h.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_finished_transient_is_not_cancelled() {
        let h = harness().await;
        h.tx.transient(CommandId::ScheduledUpdate, json!({"width": 5}))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.tx.sync(CommandId::Bigger, json!({"width": 6})).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let widths = h.widths.lock().unwrap().clone();
        assert!(widths.contains(&5));
        assert_eq!(widths.last(), Some(&6));

        h.shutdown.cancel();
        h.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_failures_and_panics_are_swallowed() {
        let h = harness().await;
        h.tx.sync(CommandId::Stat, json!(null)).unwrap();
        h.tx.sync(CommandId::Stat, json!({"panic": true})).unwrap();
        h.tx.sync(CommandId::Refresh, json!(null)).unwrap();
        h.tx.sync(CommandId::Bigger, json!({"width": 3})).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(latest_width(&h.staged), Some(3));
        assert!(!h.task.is_finished());

        h.shutdown.cancel();
        h.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_queue_stops_dispatcher() {
        let h = harness().await;
        drop(h.tx);
        tokio::time::timeout(Duration::from_secs(1), h.task)
            .await
            .unwrap()
            .unwrap();
    }
}
