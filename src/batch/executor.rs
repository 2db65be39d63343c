//! Bounded-concurrency batch dispatcher.

use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::item::{Outcome, WorkItem, WorkResult};
use crate::caller::RemoteCaller;
use crate::config::DispatchConfig;
use crate::error::Failure;
use crate::resilience::RetryPolicy;

/// Ordered results of one dispatch plus timing.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One entry per dispatched item, in the order the items were given.
    pub results: Vec<WorkResult>,
    pub execution_time: Duration,
}

impl BatchOutcome {
    /// Outcome of dispatching nothing: no results, no elapsed time.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            execution_time: Duration::ZERO,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    /// True when no item failed, including the empty batch.
    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    /// Fraction of items that succeeded, in `[0, 1]`. An empty batch reports 0.0.
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            self.success_count() as f64 / self.results.len() as f64
        }
    }
}

/// Fans work items out to a [`RemoteCaller`] with at most
/// `concurrency_limit` calls in flight.
///
/// Results are gathered as they complete, then put back in input order once
/// every item has finished. A failed item never cancels its siblings.
#[derive(Debug, Clone)]
pub struct BatchDispatcher {
    concurrency_limit: usize,
    item_timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl BatchDispatcher {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
            item_timeout: None,
            retry: RetryPolicy::disabled(),
        }
    }

    pub fn from_config(cfg: &DispatchConfig) -> Self {
        Self::new(cfg.concurrency_limit)
            .with_item_timeout(cfg.item_timeout())
            .with_retry_policy(RetryPolicy::new(&cfg.retry))
    }

    pub fn with_item_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.item_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub async fn dispatch(&self, items: Vec<WorkItem>, caller: &dyn RemoteCaller) -> BatchOutcome {
        let n = items.len();
        if n == 0 {
            return BatchOutcome::empty();
        }

        let start = Instant::now();
        let mut slots: Vec<Option<WorkResult>> = (0..n).map(|_| None).collect();

        let completed: Vec<(usize, WorkResult)> =
            futures::stream::iter(items.into_iter().enumerate())
                .map(|(pos, item)| async move {
                    let outcome = self.run_item(caller, &item).await;
                    (
                        pos,
                        WorkResult {
                            index: item.index,
                            outcome,
                        },
                    )
                })
                .buffer_unordered(self.concurrency_limit)
                .collect()
                .await;

        for (pos, r) in completed {
            slots[pos] = Some(r);
        }

        let outcome = BatchOutcome {
            results: slots.into_iter().flatten().collect(),
            execution_time: start.elapsed(),
        };
        info!(
            items = n,
            succeeded = outcome.success_count(),
            failed = outcome.failure_count(),
            elapsed_ms = outcome.execution_time.as_millis() as u64,
            "batch dispatched"
        );
        outcome
    }

    async fn run_item(&self, caller: &dyn RemoteCaller, item: &WorkItem) -> Outcome {
        let mut attempt = 0u32;
        loop {
            let result = match self.item_timeout {
                Some(limit) => match tokio::time::timeout(limit, caller.call(&item.value)).await {
                    Ok(r) => r,
                    Err(_) => Err(Failure::timeout(format!(
                        "remote call timed out after {} ms",
                        limit.as_millis()
                    ))),
                },
                None => caller.call(&item.value).await,
            };

            match result {
                Ok(text) => return Outcome::Success(text),
                Err(failure) => match self.retry.should_retry(attempt, &failure) {
                    Some(delay) => {
                        debug!(
                            index = item.index,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %failure,
                            "retrying remote call"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        debug!(index = item.index, error = %failure, "remote call failed");
                        return Outcome::Failure(failure);
                    }
                },
            }
        }
    }
}
