//! Bounded, best-effort fan-out across repositories.

use crate::error::ApiError;
use futures::future::join_all;
use std::future::Future;
use tokio::sync::{Mutex, Semaphore};
use tracing::warn;

/// Result of a fan-out: whatever succeeded, plus a record of what did not.
#[derive(Debug)]
pub struct FanOut<T> {
    pub value: T,
    /// First error seen among the repository tasks.
    pub first_error: Option<ApiError>,
    /// Number of repository tasks that failed.
    pub failed: usize,
}

impl<T> FanOut<T> {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Collects task failures, keeping the first one.
#[derive(Debug, Default)]
pub(crate) struct FailureLog {
    inner: Mutex<(Option<ApiError>, usize)>,
}

impl FailureLog {
    pub(crate) async fn record(&self, repo: &str, err: ApiError) {
        warn!("Skipping {}: {}", repo, err);
        let mut guard = self.inner.lock().await;
        guard.1 += 1;
        if guard.0.is_none() {
            guard.0 = Some(err);
        }
    }

    pub(crate) fn finish<T>(self, value: T) -> FanOut<T> {
        let (first_error, failed) = self.inner.into_inner();
        FanOut {
            value,
            first_error,
            failed,
        }
    }
}

/// Run `task` once per item with at most `limit` tasks in flight.
///
/// Waits for every task to finish. Tasks report their own failures.
pub(crate) async fn run_bounded<I, F, Fut>(items: I, limit: usize, task: F)
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = ()>,
{
    let semaphore = Semaphore::new(limit.max(1));
    let semaphore = &semaphore;
    let tasks = items.into_iter().map(|item| {
        let work = task(item);
        async move {
            let _permit = semaphore.acquire().await;
            work.await;
        }
    });
    join_all(tasks).await;
}
