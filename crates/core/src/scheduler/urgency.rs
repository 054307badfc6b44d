//! Urgency scheduler for live (non-archival) items.
//!
//! Each pass executes every due item in configuration order. When nothing
//! was due, the loop sleeps exactly until the earliest item becomes due
//! again, so an idle scheduler never polls.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use steamtrack_market_data::RetryClass;

use crate::errors::Result;
use crate::execution::{ExecutionOutcome, ItemExecutor};
use crate::items::TrackedItem;

/// Result of one scheduling pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Items whose execution finished, successfully or not.
    pub executed: usize,
    /// The pass stopped early because of cancellation.
    pub cancelled: bool,
}

pub struct UrgencyScheduler {
    items: Vec<TrackedItem>,
    executor: Arc<ItemExecutor>,
}

impl UrgencyScheduler {
    pub fn new(items: Vec<TrackedItem>, executor: Arc<ItemExecutor>) -> Self {
        Self { items, executor }
    }

    pub fn items(&self) -> &[TrackedItem] {
        &self.items
    }

    /// How long until the earliest item becomes due, or `None` with no items.
    pub fn next_wake(&self, now: Instant) -> Option<Duration> {
        self.items.iter().map(|item| item.time_until_due(now)).min()
    }

    /// Execute every item that is due, in configuration order.
    pub async fn run_pass(&mut self, cancel: &CancellationToken) -> PassReport {
        let mut report = PassReport::default();

        for index in 0..self.items.len() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if !self.items[index].is_due(Instant::now()) {
                continue;
            }

            let outcome = self.executor.execute(&self.items[index], cancel).await;
            if matches!(outcome, ExecutionOutcome::Cancelled) {
                report.cancelled = true;
                break;
            }
            apply_outcome(&mut self.items[index], outcome, Instant::now());
            report.executed += 1;
        }

        report
    }

    /// Run until cancelled.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        info!("Urgency scheduler started with {} items", self.items.len());

        loop {
            let report = self.run_pass(&cancel).await;
            if report.cancelled {
                break;
            }
            if report.executed > 0 {
                continue;
            }

            let wait = self.next_wake(Instant::now());
            debug!("Urgency scheduler idle, next item due in {:?}", wait);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep_or_park(wait) => {}
            }
        }

        info!("Urgency scheduler stopped");
        Ok(())
    }
}

/// Sleep for `wait`, or forever when there is nothing to wait for.
async fn sleep_or_park(wait: Option<Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending::<()>().await,
    }
}

/// Update an item's state after a finished execution.
fn apply_outcome(item: &mut TrackedItem, outcome: ExecutionOutcome, now: Instant) {
    match outcome {
        ExecutionOutcome::Completed(summary) => {
            item.record_success(now);
            info!("{} [{}]: {}", item.name(), item.kind, summary);
        }
        ExecutionOutcome::Failed(err) => match err.retry_class() {
            RetryClass::WithBackoff => {
                let cooldown = item.record_backoff(now);
                warn!(
                    "{} [{}]: {} (attempt {}, cooling down for {:?})",
                    item.name(),
                    item.kind,
                    err,
                    item.consecutive_failures,
                    cooldown
                );
            }
            RetryClass::SkipCycle => {
                item.record_skip(now);
                error!("{} [{}]: {} (skipped this cycle)", item.name(), item.kind, err);
            }
        },
        ExecutionOutcome::Cancelled => {}
    }
}
