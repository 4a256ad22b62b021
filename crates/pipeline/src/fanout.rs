//! Fan-out of one task per unit with a shared, lock-guarded aggregate.
//!
//! Units never cancel each other: a failing or panicking unit is recorded
//! and its siblings run to completion. The caller gets whatever the units
//! contributed together with the first error, and decides what to do with
//! both.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Mutex, Semaphore};
use tracing::warn;

use weather_common::PipelineError;

/// Aggregate of one fan-out phase.
#[derive(Debug, Default)]
pub struct PhaseOutcome<S> {
    /// Everything the units contributed, in lock acquisition order
    pub output: S,
    /// First error recorded, in completion order
    pub first_error: Option<PipelineError>,
    /// First error that must abort the pass, if any
    pub fatal_error: Option<PipelineError>,
    /// Number of recorded errors
    pub failures: usize,
}

impl<S> PhaseOutcome<S> {
    fn record(&mut self, err: PipelineError) {
        self.failures += 1;
        if err.is_fatal() && self.fatal_error.is_none() {
            self.fatal_error = Some(err.clone());
        }
        if self.first_error.is_none() {
            self.first_error = Some(err);
        }
    }
}

/// Handle a unit uses to contribute to the phase aggregate.
///
/// The lock is taken only for the append itself, never across provider or
/// routine calls.
pub struct Sink<S> {
    shared: Arc<Mutex<PhaseOutcome<S>>>,
}

impl<S> Clone for Sink<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> Sink<S> {
    /// Append to the output.
    pub async fn push(&self, append: impl FnOnce(&mut S)) {
        let mut guard = self.shared.lock().await;
        append(&mut guard.output);
    }

    /// Record a unit failure.
    pub async fn fail(&self, err: PipelineError) {
        self.shared.lock().await.record(err);
    }
}

/// Run `unit` once per item, each on its own task, and wait for all of them.
///
/// With `max_concurrency` set to `Some(n)` (n > 0) at most `n` units run at
/// a time; otherwise every unit starts immediately.
pub async fn fan_out<I, S, F, Fut>(
    items: Vec<I>,
    max_concurrency: Option<usize>,
    unit: F,
) -> PhaseOutcome<S>
where
    I: Send + 'static,
    S: Default + Send + 'static,
    F: Fn(I, Sink<S>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let shared = Arc::new(Mutex::new(PhaseOutcome::<S>::default()));
    let semaphore = max_concurrency
        .filter(|n| *n > 0)
        .map(|n| Arc::new(Semaphore::new(n)));

    let handles: Vec<_> = items
        .into_iter()
        .map(|item| {
            let work = unit(
                item,
                Sink {
                    shared: Arc::clone(&shared),
                },
            );
            let semaphore = semaphore.clone();

            tokio::spawn(async move {
                // The semaphore is never closed, so acquisition cannot fail.
                let _permit = match semaphore {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                work.await
            })
        })
        .collect();

    let joined = join_all(handles).await;

    let mut guard = shared.lock().await;
    for result in joined {
        if let Err(e) = result {
            warn!(error = %e, "Worker task failed");
            guard.record(PipelineError::WorkerFailed(e.to_string()));
        }
    }

    std::mem::take(&mut *guard)
}
