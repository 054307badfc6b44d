//! Market data storage trait.
//!
//! This module defines the persistence interface the schedulers write
//! through. Implementations handle the actual database operations; the
//! SQLite implementation lives in the `storage-sqlite` crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use steamtrack_market_data::{
    EndpointKind, HistoryPoint, ItemParams, OrderBook, OrdersActivity, PriceOverview, SeriesKey,
};

use crate::errors::Result;

/// Identity and request parameters of the item a payload belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemMetadata {
    pub key: SeriesKey,
    pub kind: EndpointKind,
    pub params: ItemParams,
}

impl ItemMetadata {
    pub fn new(kind: EndpointKind, params: ItemParams) -> Self {
        Self {
            key: SeriesKey::new(&params, kind),
            kind,
            params,
        }
    }
}

/// Storage interface for fetched market data.
///
/// # Design Notes
///
/// - Snapshot endpoints (`save_*`) append one row per successful fetch
/// - Price history is append-only and keyed by `(series key, timestamp)`;
///   `insert_history` must ignore points that already exist
/// - `last_history_timestamp` is the persistence cursor used by the delta
///   merge and only ever moves forward
#[async_trait]
pub trait MarketDataStore: Send + Sync {
    /// Append a price overview snapshot.
    async fn save_price_overview(&self, item: &ItemMetadata, data: &PriceOverview) -> Result<()>;

    /// Append an order book snapshot.
    async fn save_order_book(&self, item: &ItemMetadata, data: &OrderBook) -> Result<()>;

    /// Append a trade activity snapshot.
    async fn save_activity(&self, item: &ItemMetadata, data: &OrdersActivity) -> Result<()>;

    /// Newest persisted history timestamp for a series, if any.
    async fn last_history_timestamp(&self, key: &SeriesKey) -> Result<Option<DateTime<Utc>>>;

    /// Insert history points in one transaction, skipping duplicates.
    ///
    /// # Arguments
    ///
    /// * `item` - The series the points belong to
    /// * `currency` - ISO currency of the prices
    /// * `points` - Points in ascending timestamp order
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted.
    async fn insert_history(
        &self,
        item: &ItemMetadata,
        currency: &str,
        points: &[HistoryPoint],
    ) -> Result<usize>;
}
