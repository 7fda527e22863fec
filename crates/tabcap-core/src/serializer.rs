//! Operation serializer — a FIFO single-flight executor.
//!
//! Every state-changing entry point routes through [`OpSerializer`]:
//! submissions append to an unbounded channel consumed by exactly one
//! worker task, so at most one mutating pass observes or mutates shared
//! controller state at a time and passes execute in submission order.
//! A failing operation delivers its error only to its own submitter;
//! the drain loop keeps going.
//!
//! This replaces the reentrancy-prone boolean-lock-plus-array shape
//! with a proper channel + single consumer while preserving the "no
//! second drain loop" guarantee: a new submission while the worker is
//! busy only extends the queue.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Error, Result};

type Job = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// FIFO single-flight operation queue.
///
/// Dropping the serializer closes the channel; the worker drains any
/// already-queued operations and exits.
#[derive(Debug)]
pub struct OpSerializer {
    tx: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<()>,
}

impl OpSerializer {
    /// Spawn the single worker task. Must be called within a tokio
    /// runtime.
    #[must_use]
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                // Run to completion before looking at the next job.
                job().await;
            }
            debug!("operation serializer drained and closed");
        });
        Self { tx, worker }
    }

    /// Submit an operation and await its result.
    ///
    /// `op` is not started until every previously submitted operation
    /// has run to completion.
    pub async fn submit<T, F, Fut>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                // The submitter may have gone away; the queue keeps
                // draining regardless.
                let _ = done_tx.send(op().await);
            })
        });
        self.tx
            .send(job)
            .map_err(|_| Error::Runtime("operation queue closed".into()))?;
        done_rx
            .await
            .map_err(|_| Error::Runtime("operation dropped before completion".into()))?
    }

    /// Close the queue and wait for already-submitted operations to
    /// finish.
    pub async fn shutdown(self) {
        let Self { tx, worker } = self;
        drop(tx);
        let _ = worker.await;
    }
}

impl Default for OpSerializer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn operations_complete_in_submission_order() {
        let serializer = OpSerializer::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        // A suspends longest, yet must finish before B, which must
        // finish before C.
        let op = |name: &'static str, delay_ms: u64| {
            let log = Arc::clone(&log);
            serializer.submit(move || async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                log.lock().unwrap().push(name);
                Ok(())
            })
        };
        let (a, b, c) = tokio::join!(op("A", 30), op("B", 5), op("C", 1));
        a.unwrap();
        b.unwrap();
        c.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn a_failing_operation_does_not_abort_the_queue() {
        let serializer = OpSerializer::new();

        let failed: Result<()> = serializer
            .submit(|| async { Err(Error::Runtime("boom".into())) })
            .await;
        assert!(failed.is_err());

        let ok = serializer.submit(|| async { Ok(7usize) }).await.unwrap();
        assert_eq!(ok, 7);
    }

    #[tokio::test]
    async fn results_are_delivered_to_their_own_submitters() {
        let serializer = Arc::new(OpSerializer::new());

        let a = serializer.submit(|| async { Ok("first") });
        let b = serializer.submit(|| async { Ok("second") });
        let (a, b) = tokio::join!(a, b);
        assert_eq!(a.unwrap(), "first");
        assert_eq!(b.unwrap(), "second");
    }

    #[tokio::test]
    async fn shutdown_joins_the_worker() {
        let serializer = OpSerializer::new();
        let value = serializer.submit(|| async { Ok(5usize) }).await.unwrap();
        assert_eq!(value, 5);
        serializer.shutdown().await;
    }

    #[tokio::test]
    async fn a_dropped_submitter_does_not_wedge_the_worker() {
        let serializer = Arc::new(OpSerializer::new());

        {
            let serializer = Arc::clone(&serializer);
            let pending = tokio::spawn(async move {
                serializer
                    .submit(|| async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(())
                    })
                    .await
            });
            pending.abort();
        }

        let ok = serializer.submit(|| async { Ok(1usize) }).await.unwrap();
        assert_eq!(ok, 1);
    }
}
