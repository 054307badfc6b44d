//! Single-item execution: rate limit, fetch, persist.
//!
//! Both schedulers run items through [`ItemExecutor`], which is the only
//! place a fetch result is routed to storage.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use steamtrack_market_data::{FetchError, MarketFetcher, MarketPayload, RateLimiter, RetryClass};

use crate::delta_merge::{merge_history, MergeOutcome, DEFAULT_HISTORY_BATCH_SIZE};
use crate::errors::Error;
use crate::items::TrackedItem;
use crate::store::{ItemMetadata, MarketDataStore};

/// Why an execution failed.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to store result: {0}")]
    Store(#[source] Error),
}

impl ExecutionError {
    /// Storage failures are not retried with backoff; the next cycle will
    /// fetch again anyway.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            ExecutionError::Fetch(err) => err.retry_class(),
            ExecutionError::Store(_) => RetryClass::SkipCycle,
        }
    }
}

/// The most relevant datum of a stored payload, for logging.
#[derive(Clone, Debug, PartialEq)]
pub enum StoredSummary {
    PriceOverview { lowest_price: Option<String> },
    OrderBook { buy_order_count: Option<i64> },
    Activity { entries: usize },
    PriceHistory(MergeOutcome),
}

impl fmt::Display for StoredSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredSummary::PriceOverview { lowest_price } => {
                write!(f, "{}", lowest_price.as_deref().unwrap_or("N/A"))
            }
            StoredSummary::OrderBook { buy_order_count } => {
                write!(f, "{} buy orders", buy_order_count.unwrap_or(0))
            }
            StoredSummary::Activity { entries } => write!(f, "{} activities", entries),
            StoredSummary::PriceHistory(outcome) if outcome.inserted == 0 => {
                write!(f, "up to date")
            }
            StoredSummary::PriceHistory(outcome) => {
                write!(f, "{} new points", outcome.inserted)
            }
        }
    }
}

/// Outcome of one execution attempt.
#[derive(Debug)]
pub enum ExecutionOutcome {
    Completed(StoredSummary),
    Failed(ExecutionError),
    /// Cancelled before a rate limiter token was granted. Nothing was sent.
    Cancelled,
}

/// Route a payload to the matching store operation.
pub async fn store_payload(
    store: &dyn MarketDataStore,
    item: &ItemMetadata,
    payload: &MarketPayload,
    history_batch_size: usize,
) -> crate::errors::Result<StoredSummary> {
    match payload {
        MarketPayload::PriceOverview(data) => {
            store.save_price_overview(item, data).await?;
            Ok(StoredSummary::PriceOverview {
                lowest_price: data.lowest_price.clone(),
            })
        }
        MarketPayload::OrderBook(data) => {
            store.save_order_book(item, data).await?;
            Ok(StoredSummary::OrderBook {
                buy_order_count: data.buy_order_count,
            })
        }
        MarketPayload::Activity(data) => {
            store.save_activity(item, data).await?;
            Ok(StoredSummary::Activity {
                entries: data.parsed_activities.len(),
            })
        }
        MarketPayload::PriceHistory(data) => {
            let outcome = merge_history(store, item, data, history_batch_size).await?;
            Ok(StoredSummary::PriceHistory(outcome))
        }
    }
}

/// Executes tracked items against the shared limiter, fetcher and store.
pub struct ItemExecutor {
    limiter: Arc<RateLimiter>,
    fetcher: Arc<dyn MarketFetcher>,
    store: Arc<dyn MarketDataStore>,
    history_batch_size: usize,
}

impl ItemExecutor {
    pub fn new(
        limiter: Arc<RateLimiter>,
        fetcher: Arc<dyn MarketFetcher>,
        store: Arc<dyn MarketDataStore>,
    ) -> Self {
        Self {
            limiter,
            fetcher,
            store,
            history_batch_size: DEFAULT_HISTORY_BATCH_SIZE,
        }
    }

    pub fn with_history_batch_size(mut self, batch_size: usize) -> Self {
        self.history_batch_size = batch_size.max(1);
        self
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Acquire a token, fetch and persist one item.
    ///
    /// Cancellation is honoured only while waiting for the token. Once a
    /// token is granted the fetch and the write run to completion.
    pub async fn execute(&self, item: &TrackedItem, cancel: &CancellationToken) -> ExecutionOutcome {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return ExecutionOutcome::Cancelled,
            _ = self.limiter.acquire() => {}
        }

        let payload = match self.fetcher.fetch(item.kind, &item.params).await {
            Ok(payload) => payload,
            Err(err) => return ExecutionOutcome::Failed(err.into()),
        };

        if payload.kind() != item.kind {
            return ExecutionOutcome::Failed(
                FetchError::Validation {
                    endpoint: item.kind,
                    message: format!("fetcher returned a {} payload", payload.kind()),
                }
                .into(),
            );
        }

        let metadata = item.metadata();
        match store_payload(self.store.as_ref(), &metadata, &payload, self.history_batch_size).await
        {
            Ok(summary) => ExecutionOutcome::Completed(summary),
            Err(err) => ExecutionOutcome::Failed(ExecutionError::Store(err)),
        }
    }
}
