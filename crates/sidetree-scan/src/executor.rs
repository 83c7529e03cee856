//! Bounded worker pool for blocking filesystem walks.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::sync::oneshot;

use sidetree_core::WalkError;

/// Process-wide pool that runs walks off the async scheduler.
///
/// Cloning is cheap and shares the same pool.
#[derive(Debug, Clone)]
pub struct WalkExecutor {
    pool: Arc<ThreadPool>,
}

impl WalkExecutor {
    /// Create a pool with `threads` workers (0 = CPU count).
    pub fn new(threads: usize) -> Result<Self, WalkError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sidetree-walk-{i}"))
            .build()
            .map_err(|e| WalkError::PoolBuild {
                message: e.to_string(),
            })?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run a blocking job on the pool and await its result.
    ///
    /// A panic in the job surfaces as [`WalkError::WorkerPanicked`]. Dropping
    /// the returned future abandons the result but not the job; jobs that
    /// must stop early check a cancellation token.
    pub async fn submit<F, T>(&self, job: F) -> Result<T, WalkError>
    where
        F: FnOnce() -> Result<T, WalkError> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
                Err(WalkError::WorkerPanicked {
                    message: panic_message(payload.as_ref()),
                })
            });
            let _ = tx.send(result);
        });
        rx.await.map_err(|_| WalkError::PoolClosed)?
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
    use super::*;

    #[tokio::test]
    async fn test_submit_returns_result() {
        let executor = WalkExecutor::new(2).unwrap();
        let value = executor.submit(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(executor.threads(), 2);
    }

    #[tokio::test]
    async fn test_submit_surfaces_errors() {
        let executor = WalkExecutor::new(1).unwrap();
        let err = executor
            .submit(|| -> Result<(), WalkError> { Err(WalkError::Cancelled) })
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_submit_surfaces_panics() {
        let executor = WalkExecutor::new(1).unwrap();
        let err = executor
            .submit(|| -> Result<(), WalkError> { panic!("walk exploded") })
            .await
            .unwrap_err();
        match err {
            WalkError::WorkerPanicked { message } => assert!(message.contains("walk exploded")),
            other => panic!("unexpected error: {other}"),
        }

        // Pool survives the panic.
        assert_eq!(executor.submit(|| Ok(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions() {
        let executor = WalkExecutor::new(4).unwrap();
        let jobs = (0..8u64).map(|i| {
            let executor = executor.clone();
            tokio::spawn(async move { executor.submit(move || Ok(i * i)).await })
        })
        .collect::<Vec<_>>();
        let mut total = 0;
        for job in jobs {
            total += job.await.unwrap().unwrap();
        }
        assert_eq!(total, (0..8u64).map(|i| i * i).sum::<u64>());
    }
}
