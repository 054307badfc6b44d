//! Hour-aligned scheduler for archival items.
//!
//! Items run once at startup, then once per UTC hour at a fixed minute. A
//! cycle executes items one after another, so this scheduler never holds
//! more than one rate limiter token request at a time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use steamtrack_market_data::RetryClass;

use crate::clock::WallClock;
use crate::errors::Result;
use crate::execution::{ExecutionOutcome, ItemExecutor};
use crate::items::TrackedItem;

/// Default minute of the hour at which archival cycles start.
pub const DEFAULT_MINUTE_OFFSET: u32 = 30;

/// Bounded retry with an escalating delay schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per item and cycle, first attempt included.
    pub max_attempts: u32,
    /// Delay after the n-th failed attempt. The last entry is reused.
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delays: [30, 60, 120, 240]
                .into_iter()
                .map(Duration::from_secs)
                .collect(),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following failed attempt `failed_attempt`
    /// (1-based).
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let index = failed_attempt.saturating_sub(1) as usize;
        self.delays
            .get(index)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

/// The next run: this hour at `minute_offset`, or the next hour if that
/// minute has already started.
pub fn next_execution(now: DateTime<Utc>, minute_offset: u32) -> DateTime<Utc> {
    let minute_offset = minute_offset.min(59);
    let hour_start = now
        - TimeDelta::minutes(i64::from(now.minute()))
        - TimeDelta::seconds(i64::from(now.second()))
        - TimeDelta::nanoseconds(i64::from(now.nanosecond()));
    let target = hour_start + TimeDelta::minutes(i64::from(minute_offset));

    if now.minute() >= minute_offset {
        target + TimeDelta::hours(1)
    } else {
        target
    }
}

/// Result of one archival cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
}

pub struct FixedTimeScheduler {
    items: Vec<TrackedItem>,
    executor: Arc<ItemExecutor>,
    clock: Arc<dyn WallClock>,
    minute_offset: u32,
    retry: RetryPolicy,
}

impl FixedTimeScheduler {
    pub fn new(
        items: Vec<TrackedItem>,
        executor: Arc<ItemExecutor>,
        clock: Arc<dyn WallClock>,
    ) -> Self {
        Self {
            items,
            executor,
            clock,
            minute_offset: DEFAULT_MINUTE_OFFSET,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_minute_offset(mut self, minute_offset: u32) -> Self {
        self.minute_offset = minute_offset.min(59);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn items(&self) -> &[TrackedItem] {
        &self.items
    }

    /// Run every item once, sequentially, with per-item retries.
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();

        for index in 0..self.items.len() {
            match self.run_item(index, cancel).await {
                ItemResult::Succeeded => report.succeeded += 1,
                ItemResult::Failed => report.failed += 1,
                ItemResult::Cancelled => {
                    report.cancelled = true;
                    break;
                }
            }
        }

        report
    }

    async fn run_item(&mut self, index: usize, cancel: &CancellationToken) -> ItemResult {
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let item = &self.items[index];
            let err = match self.executor.execute(item, cancel).await {
                ExecutionOutcome::Completed(summary) => {
                    info!("{} [{}]: {}", item.name(), item.kind, summary);
                    self.items[index].record_success(Instant::now());
                    return ItemResult::Succeeded;
                }
                ExecutionOutcome::Cancelled => return ItemResult::Cancelled,
                ExecutionOutcome::Failed(err) => err,
            };

            if err.retry_class() == RetryClass::SkipCycle {
                error!(
                    "{} [{}]: {} (skipped until next hour)",
                    item.name(),
                    item.kind,
                    err
                );
                return ItemResult::Failed;
            }
            if attempt == max_attempts {
                error!(
                    "{} [{}]: {} (giving up after {} attempts)",
                    item.name(),
                    item.kind,
                    err,
                    attempt
                );
                return ItemResult::Failed;
            }

            let delay = self.retry.delay_for(attempt);
            warn!(
                "{} [{}]: {} (attempt {}/{}, retrying in {:?})",
                item.name(),
                item.kind,
                err,
                attempt,
                max_attempts,
                delay
            );
            tokio::select! {
                _ = cancel.cancelled() => return ItemResult::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        ItemResult::Failed
    }

    /// Run until cancelled.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        info!(
            "Archival scheduler started with {} items at minute {}",
            self.items.len(),
            self.minute_offset
        );

        loop {
            let report = self.run_cycle(&cancel).await;
            if report.cancelled {
                break;
            }
            debug!(
                "Archival cycle finished: {} succeeded, {} failed",
                report.succeeded, report.failed
            );

            let now = self.clock.now_utc();
            let target = next_execution(now, self.minute_offset);
            let wait = (target - now).to_std().unwrap_or(Duration::ZERO);
            info!("Next archival cycle at {}", target.format("%Y-%m-%d %H:%M:%S UTC"));

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("Archival scheduler stopped");
        Ok(())
    }
}

enum ItemResult {
    Succeeded,
    Failed,
    Cancelled,
}
