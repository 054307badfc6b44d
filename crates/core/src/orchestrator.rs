//! Composition and supervision of the schedulers.
//!
//! The orchestrator checks that the live items fit the request budget,
//! builds one rate limiter shared by both schedulers, runs each scheduler as
//! a task and stops everything as soon as the shutdown signal fires or any
//! task ends.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use steamtrack_market_data::{MarketFetcher, RateBudget, RateLimiter};

use crate::clock::{SystemWallClock, WallClock};
use crate::delta_merge::DEFAULT_HISTORY_BATCH_SIZE;
use crate::errors::{Error, Result};
use crate::execution::ItemExecutor;
use crate::items::TrackedItem;
use crate::scheduler::{FixedTimeScheduler, RetryPolicy, UrgencyScheduler, DEFAULT_MINUTE_OFFSET};
use crate::store::MarketDataStore;

/// Check that the live items can be served within the budget.
///
/// Each non-archival item needs `floor(window / interval)` requests per
/// window. Archival items run hourly and are ignored. Returns the total.
pub fn check_feasibility(budget: &RateBudget, items: &[TrackedItem]) -> Result<u64> {
    let window = budget.window.as_nanos();
    let required: u128 = items
        .iter()
        .filter(|item| !item.kind.is_archival())
        .map(|item| window.checked_div(item.interval.as_nanos()).unwrap_or(u128::MAX))
        .fold(0u128, u128::saturating_add);
    let required = u64::try_from(required).unwrap_or(u64::MAX);

    if required > u64::from(budget.max_requests) {
        return Err(Error::ConfigInfeasible {
            required,
            max_requests: budget.max_requests,
            window: budget.window,
        });
    }
    Ok(required)
}

type TaskResult = (&'static str, Result<()>);

/// Runs both schedulers against one shared rate limiter.
pub struct Orchestrator {
    budget: RateBudget,
    items: Vec<TrackedItem>,
    fetcher: Arc<dyn MarketFetcher>,
    store: Arc<dyn MarketDataStore>,
    clock: Arc<dyn WallClock>,
    history_batch_size: usize,
    minute_offset: u32,
    retry: RetryPolicy,
}

impl Orchestrator {
    pub fn new(
        budget: RateBudget,
        items: Vec<TrackedItem>,
        fetcher: Arc<dyn MarketFetcher>,
        store: Arc<dyn MarketDataStore>,
    ) -> Self {
        Self {
            budget,
            items,
            fetcher,
            store,
            clock: Arc::new(SystemWallClock),
            history_batch_size: DEFAULT_HISTORY_BATCH_SIZE,
            minute_offset: DEFAULT_MINUTE_OFFSET,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn WallClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_history_batch_size(mut self, batch_size: usize) -> Self {
        self.history_batch_size = batch_size;
        self
    }

    pub fn with_minute_offset(mut self, minute_offset: u32) -> Self {
        self.minute_offset = minute_offset;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run until `shutdown` resolves or a scheduler task ends.
    ///
    /// Returns `Err(Error::ConfigInfeasible)` before starting anything when
    /// the live items exceed the budget, and `Err(Error::TaskFailure)` when a
    /// scheduler fails or panics.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let required = check_feasibility(&self.budget, &self.items)?;
        info!(
            "Live items need {} of {} requests per {:?}",
            required, self.budget.max_requests, self.budget.window
        );

        let limiter = Arc::new(RateLimiter::new(self.budget));
        let executor = Arc::new(
            ItemExecutor::new(limiter, self.fetcher, self.store)
                .with_history_batch_size(self.history_batch_size),
        );

        let (archival, live): (Vec<_>, Vec<_>) = self
            .items
            .into_iter()
            .partition(|item| item.kind.is_archival());

        if archival.is_empty() && live.is_empty() {
            warn!("No tracking items configured, nothing to do");
            return Ok(());
        }

        let root = CancellationToken::new();
        let mut tasks: JoinSet<TaskResult> = JoinSet::new();

        if !live.is_empty() {
            let mut scheduler = UrgencyScheduler::new(live, executor.clone());
            let cancel = root.child_token();
            tasks.spawn(async move { ("urgency", scheduler.run(cancel).await) });
        }
        if !archival.is_empty() {
            let mut scheduler = FixedTimeScheduler::new(archival, executor, self.clock)
                .with_minute_offset(self.minute_offset)
                .with_retry_policy(self.retry);
            let cancel = root.child_token();
            tasks.spawn(async move { ("archival", scheduler.run(cancel).await) });
        }

        tokio::pin!(shutdown);
        let mut failure = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping schedulers");
                None
            }
            Some(joined) = tasks.join_next() => {
                let failure = task_failure(joined);
                if failure.is_none() {
                    warn!("A scheduler stopped on its own, stopping the rest");
                }
                failure
            }
        };

        root.cancel();
        while let Some(joined) = tasks.join_next().await {
            if let Some(err) = task_failure(joined) {
                failure.get_or_insert(err);
            }
        }

        match failure {
            Some(message) => Err(Error::TaskFailure(message)),
            None => {
                info!("All schedulers stopped");
                Ok(())
            }
        }
    }
}

/// Describe a failed or panicked task, or `None` if it ended cleanly.
fn task_failure(joined: std::result::Result<TaskResult, tokio::task::JoinError>) -> Option<String> {
    match joined {
        Ok((_, Ok(()))) => None,
        Ok((name, Err(err))) => {
            error!("{} scheduler failed: {}", name, err);
            Some(format!("{} scheduler: {}", name, err))
        }
        Err(err) => {
            error!("Scheduler task ended abnormally: {}", err);
            Some(err.to_string())
        }
    }
}
