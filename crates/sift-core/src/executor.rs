//! The bounded-concurrency executor.
//!
//! Caps the number of tasks running at once. Excess submissions wait in a
//! FIFO queue and start exactly when a slot frees. The running counter and
//! the wait queue live under one mutex, and a finishing task hands its slot
//! directly to the next waiter inside that critical section, so the limit
//! can never be exceeded.
//!
//! `TaskHandle` aborts its task when dropped. A stage whose slice expires
//! drops its handles, which stops the work it submitted instead of leaving
//! it running in the background.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use sift_contracts::error::{SiftError, SiftResult};

// ── Internal state ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SlotState {
    running: usize,
    /// Waiters in arrival order. Sending `()` hands over one slot.
    queue: VecDeque<oneshot::Sender<()>>,
}

#[derive(Debug)]
struct Shared {
    limit: usize,
    state: Mutex<SlotState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Give the slot to the oldest live waiter, or free it.
    fn release(&self) {
        let mut state = self.lock();
        while let Some(waiter) = state.queue.pop_front() {
            if waiter.send(()).is_ok() {
                trace!(running = state.running, queued = state.queue.len(), "slot handed to queued task");
                return;
            }
        }
        state.running -= 1;
    }
}

/// Owned while a task runs; frees the slot on drop (including abort/panic).
struct Slot {
    shared: Arc<Shared>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.shared.release();
    }
}

/// How a submitted task obtains its slot.
enum Admission {
    Immediate(Slot),
    Queued(Waiter),
}

impl Admission {
    async fn wait(self) -> Slot {
        match self {
            Admission::Immediate(slot) => slot,
            Admission::Queued(waiter) => waiter.wait().await,
        }
    }
}

/// A queued task's claim on the next free slot.
struct Waiter {
    shared: Arc<Shared>,
    rx: Option<oneshot::Receiver<()>>,
}

impl Waiter {
    async fn wait(mut self) -> Slot {
        if let Some(receiver) = self.rx.as_mut() {
            // The sender lives in the queue until it hands over a slot, and
            // the queue outlives us through `shared`, so this only returns Ok.
            let _ = receiver.await;
        }
        self.rx = None;
        Slot {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        // Abandoned while waiting: close the channel so no hand-off can land
        // after this point, then pass on a slot that already did.
        if let Some(mut receiver) = self.rx.take() {
            receiver.close();
            if receiver.try_recv().is_ok() {
                self.shared.release();
            }
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Handle to a submitted task. Resolves to the task's output.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    inner: JoinHandle<T>,
}

impl<T> Future for TaskHandle<T> {
    type Output = SiftResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx).map(|result| {
            result.map_err(|e| SiftError::TaskAborted {
                reason: e.to_string(),
            })
        })
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        self.inner.abort();
    }
}

/// Runs at most `limit` submitted tasks at a time, queueing the rest FIFO.
///
/// Construct one per process and share it via `Arc`; every pipeline run
/// submits through the same instance.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    shared: Arc<Shared>,
}

impl BoundedExecutor {
    /// Create an executor. A `limit` of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                limit: limit.max(1),
                state: Mutex::new(SlotState::default()),
            }),
        }
    }

    pub fn limit(&self) -> usize {
        self.shared.limit
    }

    /// Number of tasks currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.shared.lock().running
    }

    /// Number of tasks waiting for a slot.
    pub fn queued(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Submit `task`. It starts now if a slot is free, otherwise after every
    /// earlier queued task has started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<F>(&self, task: F) -> TaskHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let admission = {
            let mut state = self.shared.lock();
            if state.running < self.shared.limit {
                state.running += 1;
                Admission::Immediate(Slot {
                    shared: self.shared.clone(),
                })
            } else {
                let (tx, rx) = oneshot::channel();
                state.queue.push_back(tx);
                debug!(
                    limit = self.shared.limit,
                    queued = state.queue.len(),
                    "executor saturated, task queued"
                );
                Admission::Queued(Waiter {
                    shared: self.shared.clone(),
                    rx: Some(rx),
                })
            }
        };

        let inner = tokio::spawn(async move {
            let _slot = admission.wait().await;
            task.await
        });

        TaskHandle { inner }
    }

    /// Run `tasks` in sequential batches of `batch_size`.
    ///
    /// Each batch is submitted, then awaited in full before the next batch
    /// starts. Results keep submission order.
    pub async fn process_batch<F>(&self, tasks: Vec<F>, batch_size: usize) -> Vec<SiftResult<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let batch_size = batch_size.max(1);
        let mut results = Vec::with_capacity(tasks.len());
        let mut pending = tasks.into_iter().peekable();

        while pending.peek().is_some() {
            let handles: Vec<TaskHandle<F::Output>> = pending
                .by_ref()
                .take(batch_size)
                .map(|task| self.submit(task))
                .collect();
            for handle in handles {
                results.push(handle.await);
            }
        }

        results
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use sift_contracts::error::SiftError;

    use super::BoundedExecutor;

    #[tokio::test]
    async fn never_runs_more_than_limit_tasks() {
        let executor = BoundedExecutor::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let running = running.clone();
                let peak = peak.clone();
                executor.submit(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(executor.in_flight(), 0);
        assert_eq!(executor.queued(), 0);
    }

    #[tokio::test]
    async fn queued_tasks_start_in_arrival_order() {
        let executor = BoundedExecutor::new(1);
        let started = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let started = started.clone();
                executor.submit(async move {
                    started.lock().unwrap().push(i);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*started.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn process_batch_preserves_submission_order() {
        let executor = BoundedExecutor::new(4);

        // Later tasks finish first; results must still follow input order.
        let tasks: Vec<_> = (0..6u64)
            .map(|i| async move {
                tokio::time::sleep(Duration::from_millis(30 - i * 5)).await;
                i
            })
            .collect();

        let results: Vec<u64> = executor
            .process_batch(tasks, 3)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(results, vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn dropping_a_handle_aborts_the_task_and_frees_its_slot() {
        let executor = BoundedExecutor::new(1);
        let finished = Arc::new(AtomicUsize::new(0));

        let slow = {
            let finished = finished.clone();
            executor.submit(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            })
        };
        // Queued behind the slow task, then abandoned while waiting.
        let abandoned = executor.submit(async { 1 });
        tokio::time::sleep(Duration::from_millis(10)).await;

        drop(abandoned);
        drop(slow);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert_eq!(executor.in_flight(), 0);

        let value = tokio::time::timeout(Duration::from_secs(1), executor.submit(async { 7 }))
            .await
            .expect("slot must be free again")
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn panicking_task_reports_aborted_and_releases_slot() {
        let executor = BoundedExecutor::new(1);

        let result = executor
            .submit(async {
                if true {
                    panic!("boom");
                }
                "unreachable"
            })
            .await;

        assert!(matches!(result, Err(SiftError::TaskAborted { .. })));
        assert_eq!(executor.submit(async { "ok" }).await.unwrap(), "ok");
    }
}
