//! Periodic background refresh.

use std::time::Duration;

use serde_json::json;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::queue::EventSender;
use crate::scheduler::Staged;
use crate::transition::CommandId;

/// Enqueues a forced sync update at startup, then a transient update every
/// `period` while the host has focus.
pub struct Ticker {
    period: Duration,
    events: EventSender,
    staged: Staged,
    initial_focus: bool,
}

impl Ticker {
    pub fn new(period: Duration, events: EventSender, staged: Staged, initial_focus: bool) -> Self {
        Self {
            period,
            events,
            staged,
            initial_focus,
        }
    }

    /// Focus as of the latest commit.
    fn host_focus(&self) -> bool {
        self.staged
            .borrow()
            .as_ref()
            .map_or(self.initial_focus, |stage| stage.state.host_focus)
    }

    pub async fn run(self, shutdown: CancellationToken) {
        if self
            .events
            .sync(CommandId::ScheduledUpdate, json!({ "force": true }))
            .is_err()
        {
            return;
        }

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }
            if !self.host_focus() {
                continue;
            }
            if self
                .events
                .transient(CommandId::ScheduledUpdate, json!(null))
                .is_err()
            {
                break;
            }
        }
        tracing::debug!("ticker stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;
    use tokio::sync::watch;

    use super::*;
    use crate::queue::{EventClass, channel};
    use crate::state::Stage;
    use crate::transitions::fixture::state_at;

    #[tokio::test]
    async fn test_startup_then_periodic() {
        let (tx, mut rx) = channel();
        let (_staged_tx, staged) = watch::channel(None);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(
            Ticker::new(Duration::from_millis(30), tx, staged, true).run(shutdown.clone()),
        );

        let first = rx.recv().await.unwrap();
        assert_eq!(first.class, EventClass::Sync);
        assert_eq!(first.args, json!({ "force": true }));

        let second = rx.recv().await.unwrap();
        assert_eq!(second.class, EventClass::Transient);
        assert_eq!(second.command, CommandId::ScheduledUpdate);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_no_ticks_without_focus() {
        let temp = TempDir::new().unwrap();
        let mut state = state_at(&temp, temp.path()).await;
        state.host_focus = false;

        let (tx, mut rx) = channel();
        let (_staged_tx, staged) = watch::channel(Some(Arc::new(Stage::new(state))));
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(
            Ticker::new(Duration::from_millis(20), tx, staged, true).run(shutdown.clone()),
        );

        assert_eq!(rx.recv().await.unwrap().class, EventClass::Sync);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(rx.try_recv().is_err());

        shutdown.cancel();
        task.await.unwrap();
    }
}
