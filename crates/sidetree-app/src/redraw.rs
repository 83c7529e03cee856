//! The redraw gate: renders the latest committed stage.

use std::time::Instant;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::RenderError;
use crate::scheduler::Staged;
use crate::state::Stage;

/// Host-side drawing of a stage.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, stage: &Stage) -> Result<(), RenderError>;
}

/// Waits for commits and renders the newest one.
///
/// Bursts of commits landing before the gate wakes produce a single render
/// of the last stage.
pub struct RedrawGate<R> {
    renderer: R,
    retries: usize,
    profiling: bool,
    started: Instant,
}

impl<R: Renderer> RedrawGate<R> {
    pub fn new(renderer: R, retries: usize) -> Self {
        Self {
            renderer,
            retries: retries.max(1),
            profiling: false,
            started: Instant::now(),
        }
    }

    /// Log time to first draw, measured from `started`.
    pub fn with_profiling(mut self, started: Instant) -> Self {
        self.profiling = true;
        self.started = started;
        self
    }

    pub async fn run(self, mut staged: Staged, shutdown: CancellationToken) {
        let mut has_drawn = false;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                changed = staged.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            // Snapshot at wake time; later commits mark the receiver changed again.
            let Some(stage) = staged.borrow_and_update().clone() else {
                continue;
            };
            if self.draw(&stage).await && self.profiling && !has_drawn {
                has_drawn = true;
                self.profile();
            }
        }
        tracing::debug!("redraw gate stopped");
    }

    /// Render with retries. Returns whether a render succeeded.
    async fn draw(&self, stage: &Stage) -> bool {
        for attempt in 1..=self.retries {
            match self.renderer.render(stage).await {
                Ok(()) => return true,
                Err(RenderError::Unavailable(reason)) if attempt < self.retries => {
                    tracing::debug!(attempt, %reason, "render retry");
                }
                Err(err @ RenderError::Unavailable(_)) => {
                    tracing::warn!(error = %err, attempts = attempt, "render gave up");
                }
                Err(err) => {
                    tracing::error!(error = %err, "render failed");
                    return false;
                }
            }
        }
        false
    }

    fn profile(&self) {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        tracing::info!(
            first_draw_ms = self.started.elapsed().as_millis() as u64,
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            cores,
            "first draw"
        );
    }
}
