//! Worker pool dispatching connection handlers.
//!
//! Two capacity policies: a bounded pool with a fixed number of concurrent
//! workers (excess submissions queue until a slot frees up), and an
//! unbounded task-per-connection variant with no backpressure. Either way
//! the pool owns the handler tasks and drains them on shutdown.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

/// Default worker count for the bounded policy.
pub const DEFAULT_WORKERS: usize = 50;

/// Capacity policy for the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolPolicy {
    /// A task per connection, no queueing. Acceptable for bursty low load;
    /// resource use is unbounded under flood.
    Unbounded,
    /// At most this many handlers run at once; further submissions wait in
    /// FIFO order for a free slot.
    Bounded(usize),
}

/// Pool of in-flight connection handlers.
pub struct WorkerPool {
    permits: Option<Arc<Semaphore>>,
    tasks: JoinSet<()>,
}

impl WorkerPool {
    pub fn new(policy: PoolPolicy) -> Self {
        let permits = match policy {
            PoolPolicy::Unbounded => None,
            PoolPolicy::Bounded(n) => Some(Arc::new(Semaphore::new(n.max(1)))),
        };
        WorkerPool {
            permits,
            tasks: JoinSet::new(),
        }
    }

    /// Dispatch one connection's handler.
    ///
    /// Under the bounded policy this waits until a worker slot is free, so
    /// the accept loop stops pulling new connections while the pool is
    /// saturated; the permit is released when the handler finishes.
    pub async fn submit<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Reap finished handlers so the set stays proportional to the
        // number of in-flight connections.
        while self.tasks.try_join_next().is_some() {}

        let permit = match &self.permits {
            Some(permits) => match Arc::clone(permits).acquire_owned().await {
                Ok(permit) => Some(permit),
                // The semaphore is never closed while the pool exists.
                Err(_) => return,
            },
            None => None,
        };

        self.tasks.spawn(async move {
            task.await;
            drop(permit);
        });
    }

    /// Number of handlers still tracked by the pool.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Stop accepting submissions and wait for in-flight handlers.
    pub async fn shutdown(mut self) {
        info!(in_flight = self.tasks.len(), "Draining worker pool");
        while self.tasks.join_next().await.is_some() {}
        info!("Worker pool drained");
    }
}
