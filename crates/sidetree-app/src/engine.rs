//! Wiring of dispatcher, redraw gate and ticker.

use std::path::PathBuf;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use sidetree_core::Settings;
use sidetree_scan::WalkExecutor;

use crate::error::EngineError;
use crate::queue::{EventReceiver, EventSender, channel};
use crate::redraw::{RedrawGate, Renderer};
use crate::scheduler::{Dispatcher, Staged};
use crate::state::State;
use crate::ticker::Ticker;
use crate::transition::Registry;

/// A ready-to-run engine for one working directory.
pub struct Engine<R> {
    dispatcher: Dispatcher,
    staged: Staged,
    gate: RedrawGate<R>,
    ticker: Ticker,
    events: EventSender,
    receiver: EventReceiver,
    shutdown: CancellationToken,
}

impl<R: Renderer> Engine<R> {
    /// Walk `workdir` and prepare the engine with the built-in commands.
    pub async fn new(settings: Settings, workdir: PathBuf, renderer: R) -> Result<Self, EngineError> {
        Self::with_registry(settings, workdir, renderer, Registry::builtin()).await
    }

    pub async fn with_registry(
        settings: Settings,
        workdir: PathBuf,
        renderer: R,
        registry: Registry,
    ) -> Result<Self, EngineError> {
        let started = Instant::now();
        let executor = WalkExecutor::new(settings.walk_threads)?;
        tracing::debug!(threads = executor.threads(), "walk pool ready");

        let period = settings.polling_rate();
        let retries = settings.render_retries;
        let profiling = settings.profiling;

        let state = State::initial(settings, workdir, executor).await?;
        let initial_focus = state.host_focus;
        tracing::info!(
            root = %state.root.path.display(),
            nodes = state.root.len(),
            "initial walk done"
        );

        let (dispatcher, staged) = Dispatcher::new(registry, state);
        let (events, receiver) = channel();

        let mut gate = RedrawGate::new(renderer, retries);
        if profiling {
            gate = gate.with_profiling(started);
        }
        let ticker = Ticker::new(period, events.clone(), dispatcher.subscribe(), initial_focus);

        Ok(Self {
            dispatcher,
            staged,
            gate,
            ticker,
            events,
            receiver,
            shutdown: CancellationToken::new(),
        })
    }

    /// Queue handle for the host.
    pub fn sender(&self) -> EventSender {
        self.events.clone()
    }

    /// Cancelling this token stops [`Engine::run`].
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Receiver of committed stages, for hosts that read state directly.
    pub fn subscribe(&self) -> Staged {
        self.dispatcher.subscribe()
    }

    /// Run the dispatcher, redraw gate and ticker until shutdown.
    pub async fn run(self) {
        let Self {
            dispatcher,
            staged,
            gate,
            ticker,
            events,
            receiver,
            shutdown,
        } = self;
        drop(events);

        let dispatch = {
            let shutdown = shutdown.clone();
            async move {
                dispatcher.run(receiver, shutdown.clone()).await;
                // Without a dispatcher nothing else can make progress.
                shutdown.cancel();
            }
        };
        tokio::join!(
            dispatch,
            gate.run(staged, shutdown.clone()),
            ticker.run(shutdown.clone()),
        );
    }
}
