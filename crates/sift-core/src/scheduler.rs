//! The stage budget scheduler: deadline slices and the primary/fallback race.
//!
//! Every stage of a run goes through `StageBudgetScheduler::run`:
//!
//!   slice = max(min_ms, floor(remaining(deadline) * ratio))
//!
//! The primary task races a `slice`-long timer. Three outcomes matter and
//! are kept distinct:
//!
//! - primary finishes first → its value, `StagePath::Primary`
//! - primary fails first    → the error, unchanged; the fallback is NOT used
//! - timer fires first      → the stage token is cancelled, the primary
//!   future is dropped, and `fallback()` is returned with `StagePath::Fallback`
//!
//! Hard cancellation of the run token beats all three and yields
//! `SiftError::Cancelled`. Retries are the caller's responsibility.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use sift_contracts::{
    error::{SiftError, SiftResult},
    stage::{StageBudget, StageKind, StagePath},
};

use crate::cancel::CancellationToken;

/// The absolute instant by which a run should have produced output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    At(Instant),
    Unbounded,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Deadline::At(Instant::now() + budget)
    }

    /// `Some(ms)` → deadline that many milliseconds from now; `None` → unbounded.
    pub fn from_millis(ms: Option<u64>) -> Self {
        match ms {
            Some(ms) => Deadline::after(Duration::from_millis(ms)),
            None => Deadline::Unbounded,
        }
    }

    /// Time left, or `None` when unbounded. Saturates at zero once passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_at(Instant::now())
    }

    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        match self {
            Deadline::At(instant) => Some(instant.saturating_duration_since(now)),
            Deadline::Unbounded => None,
        }
    }
}

/// Slice length for a stage starting now. `None` means no timer at all.
pub fn compute_slice(deadline: &Deadline, budget: StageBudget) -> Option<Duration> {
    compute_slice_at(deadline, budget, Instant::now())
}

pub fn compute_slice_at(deadline: &Deadline, budget: StageBudget, now: Instant) -> Option<Duration> {
    deadline.remaining_at(now).map(|remaining| {
        let scaled = (remaining.as_millis() as f64 * budget.ratio.max(0.0)).floor() as u64;
        Duration::from_millis(budget.min_ms.max(scaled))
    })
}

/// What one scheduled stage produced and how.
#[derive(Debug, Clone)]
pub struct StageReport<T> {
    pub value: T,
    pub path: StagePath,
    /// The slice the stage was given; `None` when the deadline is unbounded.
    pub slice: Option<Duration>,
    pub elapsed: Duration,
}

impl<T> StageReport<T> {
    pub fn fell_back(&self) -> bool {
        self.path == StagePath::Fallback
    }
}

enum Race<T> {
    Finished(SiftResult<T>),
    Expired,
    Cancelled,
}

/// Allocates deadline slices and races stage work against them.
#[derive(Debug, Default, Clone, Copy)]
pub struct StageBudgetScheduler;

impl StageBudgetScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Run `primary` under the stage's slice, substituting `fallback` on expiry.
    ///
    /// `primary` receives a child of `cancel`; it is cancelled when the slice
    /// expires so any work the stage handed off stops as well.
    ///
    /// # Errors
    ///
    /// Returns the primary's own error if it fails before the slice expires,
    /// and `SiftError::Cancelled` if `cancel` fires first.
    pub async fn run<T, P, Fut, F>(
        &self,
        stage: StageKind,
        deadline: &Deadline,
        budget: StageBudget,
        cancel: &CancellationToken,
        primary: P,
        fallback: F,
    ) -> SiftResult<StageReport<T>>
    where
        P: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = SiftResult<T>>,
        F: FnOnce() -> T,
    {
        let slice = compute_slice(deadline, budget);
        let started = Instant::now();
        let stage_token = cancel.child_token();

        debug!(
            stage = %stage,
            slice_ms = slice.map(|s| s.as_millis() as u64),
            ratio = budget.ratio,
            min_ms = budget.min_ms,
            "stage starting"
        );

        let mut primary_fut = Box::pin(primary(stage_token.clone()));

        let race = match slice {
            Some(slice) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Race::Cancelled,
                    result = &mut primary_fut => Race::Finished(result),
                    _ = tokio::time::sleep(slice) => Race::Expired,
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Race::Cancelled,
                    result = &mut primary_fut => Race::Finished(result),
                }
            }
        };

        let elapsed = started.elapsed();

        match race {
            Race::Finished(Ok(value)) => {
                debug!(
                    stage = %stage,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "stage completed"
                );
                Ok(StageReport {
                    value,
                    path: StagePath::Primary,
                    slice,
                    elapsed,
                })
            }

            // Failed fast: surface the failure, never the fallback.
            Race::Finished(Err(err)) => {
                stage_token.cancel();
                warn!(
                    stage = %stage,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "stage failed before its slice expired"
                );
                Err(err)
            }

            Race::Expired => {
                stage_token.cancel();
                drop(primary_fut);
                info!(
                    stage = %stage,
                    slice_ms = slice.map(|s| s.as_millis() as u64),
                    "stage slice expired, primary stopped, using fallback"
                );
                Ok(StageReport {
                    value: fallback(),
                    path: StagePath::Fallback,
                    slice,
                    elapsed,
                })
            }

            Race::Cancelled => {
                stage_token.cancel();
                warn!(stage = %stage, "run cancelled while stage was in flight");
                Err(SiftError::Cancelled {
                    stage: stage.to_string(),
                })
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
