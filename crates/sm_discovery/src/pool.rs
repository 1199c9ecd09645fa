use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs a set of futures with at most `limit` of them in flight.
///
/// Every task is awaited to completion. A task that fails reports through its
/// own output and never cancels its siblings.
#[derive(Debug, Clone)]
pub struct BoundedPool {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl BoundedPool {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Results come back in task order.
    pub async fn run_all<I, F, T>(&self, tasks: I) -> Vec<T>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = T>,
    {
        let futures: Vec<_> = tasks.into_iter().map(|task| {
            let permits = self.permits.clone();
            async move {
                // The semaphore is never closed, so a failed acquire cannot happen.
                let _permit = permits.acquire_owned().await.ok();
                task.await
            }
        }).collect();

        join_all(futures).await
    }
}
