use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::{
    parse_timestamp, NewActivityDB, NewOrderBookDB, NewPriceOverviewDB, PriceHistoryDB,
};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::orders_activity::dsl as activity_dsl;
use crate::schema::orders_histogram::dsl as histogram_dsl;
use crate::schema::price_history::dsl as history_dsl;
use crate::schema::price_overview::dsl as overview_dsl;
use crate::utils::chunk_rows_for_sqlite;
use steamtrack_core::errors::{DatabaseError, Error};
use steamtrack_core::{ItemMetadata, MarketDataStore, Result};
use steamtrack_market_data::{HistoryPoint, OrderBook, OrdersActivity, PriceOverview, SeriesKey};

/// Bound parameters per `price_history` row.
const HISTORY_COLUMNS: usize = 10;

pub struct MarketDataRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl MarketDataRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// All stored history rows of a series, oldest first.
    pub fn history(&self, key: &SeriesKey) -> Result<Vec<PriceHistoryDB>> {
        let mut conn = get_connection(&self.pool)?;
        history_dsl::price_history
            .filter(history_dsl::series_key.eq(key.as_str()))
            .order(history_dsl::time.asc())
            .select(PriceHistoryDB::as_select())
            .load::<PriceHistoryDB>(&mut conn)
            .into_core()
    }

    /// Number of snapshot rows stored for a series, across the snapshot tables.
    pub fn snapshot_count(&self, key: &SeriesKey) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let overview: i64 = overview_dsl::price_overview
            .filter(overview_dsl::series_key.eq(key.as_str()))
            .count()
            .get_result(&mut conn)
            .into_core()?;
        let histogram: i64 = histogram_dsl::orders_histogram
            .filter(histogram_dsl::series_key.eq(key.as_str()))
            .count()
            .get_result(&mut conn)
            .into_core()?;
        let activity: i64 = activity_dsl::orders_activity
            .filter(activity_dsl::series_key.eq(key.as_str()))
            .count()
            .get_result(&mut conn)
            .into_core()?;
        Ok(overview + histogram + activity)
    }
}

// =============================================================================
// MarketDataStore Implementation
// =============================================================================

#[async_trait]
impl MarketDataStore for MarketDataRepository {
    // =========================================================================
    // Snapshots
    // =========================================================================

    async fn save_price_overview(&self, item: &ItemMetadata, data: &PriceOverview) -> Result<()> {
        let row = NewPriceOverviewDB::new(item, data, Utc::now())?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(overview_dsl::price_overview)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }

    async fn save_order_book(&self, item: &ItemMetadata, data: &OrderBook) -> Result<()> {
        let row = NewOrderBookDB::new(item, data, Utc::now())?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(histogram_dsl::orders_histogram)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }

    async fn save_activity(&self, item: &ItemMetadata, data: &OrdersActivity) -> Result<()> {
        let row = NewActivityDB::new(item, data, Utc::now())?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(activity_dsl::orders_activity)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::QueryFailed)?;
                Ok(())
            })
            .await
    }

    // =========================================================================
    // Price history
    // =========================================================================

    async fn last_history_timestamp(&self, key: &SeriesKey) -> Result<Option<DateTime<Utc>>> {
        let mut conn = get_connection(&self.pool)?;

        let newest: Option<String> = history_dsl::price_history
            .filter(history_dsl::series_key.eq(key.as_str()))
            .select(max(history_dsl::time))
            .first(&mut conn)
            .into_core()?;

        match newest {
            None => Ok(None),
            Some(text) => parse_timestamp(&text).map(Some).ok_or_else(|| {
                Error::Database(DatabaseError::Internal(format!(
                    "unreadable price_history time '{}' for {}",
                    text, key
                )))
            }),
        }
    }

    async fn insert_history(
        &self,
        item: &ItemMetadata,
        currency: &str,
        points: &[HistoryPoint],
    ) -> Result<usize> {
        if points.is_empty() {
            return Ok(0);
        }

        let rows = PriceHistoryDB::rows(item, currency, points)?;
        let key = item.key.to_string();

        let inserted = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut inserted = 0;
                for chunk in chunk_rows_for_sqlite(&rows, HISTORY_COLUMNS) {
                    inserted += diesel::insert_or_ignore_into(history_dsl::price_history)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::QueryFailed)?;
                }
                Ok(inserted)
            })
            .await?;

        debug!("Inserted {} of {} history points for {}", inserted, points.len(), key);
        Ok(inserted)
    }
}
