//! Database models for market snapshots and price history.

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use steamtrack_core::errors::{Error, Result};
use steamtrack_core::ItemMetadata;
use steamtrack_market_data::{HistoryPoint, OrderBook, OrdersActivity, PriceOverview};

use crate::errors::IntoCore;

/// Storage format of every timestamp column (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Currency recorded when a payload carries no recognizable marker.
const FALLBACK_CURRENCY: &str = "USD";

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Item columns shared by every table.
struct ItemColumns {
    series_key: String,
    appid: i64,
    market_hash_name: String,
    item_nameid: Option<i64>,
    country: String,
    language: String,
}

impl ItemColumns {
    fn new(item: &ItemMetadata) -> Result<Self> {
        let item_nameid = item
            .params
            .item_nameid
            .map(|id| {
                i64::try_from(id).map_err(|_| {
                    Error::InvalidConfigValue(format!("item_nameid {} is out of range", id))
                })
            })
            .transpose()?;

        Ok(Self {
            series_key: item.key.to_string(),
            appid: i64::from(item.params.appid),
            market_hash_name: item.params.market_hash_name.clone(),
            item_nameid,
            country: item.params.country.clone(),
            language: item.params.language.clone(),
        })
    }

    fn required_item_nameid(&self) -> Result<i64> {
        self.item_nameid.ok_or_else(|| {
            Error::InvalidConfigValue(format!(
                "'{}' has no item_nameid",
                self.market_hash_name
            ))
        })
    }
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::price_overview)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewPriceOverviewDB {
    pub timestamp: String,
    pub series_key: String,
    pub appid: i64,
    pub market_hash_name: String,
    pub item_nameid: Option<i64>,
    pub currency: String,
    pub country: String,
    pub language: String,
    pub lowest_price: Option<String>,
    pub median_price: Option<String>,
    pub volume: Option<i64>,
}

impl NewPriceOverviewDB {
    pub fn new(item: &ItemMetadata, data: &PriceOverview, recorded_at: DateTime<Utc>) -> Result<Self> {
        let columns = ItemColumns::new(item)?;
        Ok(Self {
            timestamp: format_timestamp(recorded_at),
            series_key: columns.series_key,
            appid: columns.appid,
            market_hash_name: columns.market_hash_name,
            item_nameid: columns.item_nameid,
            currency: data.currency().unwrap_or(FALLBACK_CURRENCY).to_string(),
            country: columns.country,
            language: columns.language,
            lowest_price: data.lowest_price_value().map(|p| p.to_string()),
            median_price: data.median_price_value().map(|p| p.to_string()),
            volume: data.volume_value(),
        })
    }
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::orders_histogram)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewOrderBookDB {
    pub timestamp: String,
    pub series_key: String,
    pub appid: i64,
    pub market_hash_name: String,
    pub item_nameid: i64,
    pub currency: String,
    pub country: String,
    pub language: String,
    pub buy_order_table: Option<String>,
    pub sell_order_table: Option<String>,
    pub buy_order_graph: Option<String>,
    pub sell_order_graph: Option<String>,
    pub buy_order_count: Option<i64>,
    pub sell_order_count: Option<i64>,
    pub highest_buy_order: Option<String>,
    pub lowest_sell_order: Option<String>,
}

impl NewOrderBookDB {
    pub fn new(item: &ItemMetadata, data: &OrderBook, recorded_at: DateTime<Utc>) -> Result<Self> {
        let columns = ItemColumns::new(item)?;
        let item_nameid = columns.required_item_nameid()?;

        let non_empty_json = |values: &[serde_json::Value]| -> Result<Option<String>> {
            if values.is_empty() {
                return Ok(None);
            }
            serde_json::to_string(values).map(Some).into_core()
        };

        Ok(Self {
            timestamp: format_timestamp(recorded_at),
            series_key: columns.series_key,
            appid: columns.appid,
            market_hash_name: columns.market_hash_name,
            item_nameid,
            currency: data.currency().unwrap_or(FALLBACK_CURRENCY).to_string(),
            country: columns.country,
            language: columns.language,
            buy_order_table: data
                .buy_order_table
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .into_core()?,
            sell_order_table: data
                .sell_order_table
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .into_core()?,
            buy_order_graph: non_empty_json(&data.buy_order_graph)?,
            sell_order_graph: non_empty_json(&data.sell_order_graph)?,
            buy_order_count: data.buy_order_count,
            sell_order_count: data.sell_order_count,
            highest_buy_order: data.highest_buy_value().map(|p| p.to_string()),
            lowest_sell_order: data.lowest_sell_value().map(|p| p.to_string()),
        })
    }
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::orders_activity)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewActivityDB {
    pub timestamp: String,
    pub series_key: String,
    pub appid: i64,
    pub market_hash_name: String,
    pub item_nameid: i64,
    pub currency: String,
    pub country: String,
    pub language: String,
    pub activity_raw: Option<String>,
    pub parsed_activities: Option<String>,
    pub activity_count: i64,
    pub steam_timestamp: i64,
}

impl NewActivityDB {
    pub fn new(item: &ItemMetadata, data: &OrdersActivity, recorded_at: DateTime<Utc>) -> Result<Self> {
        let columns = ItemColumns::new(item)?;
        let item_nameid = columns.required_item_nameid()?;

        let activity_raw = if data.activity.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&data.activity).into_core()?)
        };
        let parsed_activities = if data.parsed_activities.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&data.parsed_activities).into_core()?)
        };

        Ok(Self {
            timestamp: format_timestamp(recorded_at),
            series_key: columns.series_key,
            appid: columns.appid,
            market_hash_name: columns.market_hash_name,
            item_nameid,
            currency: data.currency().unwrap_or(FALLBACK_CURRENCY).to_string(),
            country: columns.country,
            language: columns.language,
            activity_raw,
            parsed_activities,
            activity_count: i64::try_from(data.parsed_activities.len()).unwrap_or(i64::MAX),
            steam_timestamp: data.timestamp,
        })
    }
}

/// One row of `price_history`.
#[derive(
    Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::price_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceHistoryDB {
    pub series_key: String,
    pub time: String,
    pub appid: i64,
    pub market_hash_name: String,
    pub item_nameid: Option<i64>,
    pub currency: String,
    pub country: String,
    pub language: String,
    pub price: String,
    pub volume: i64,
}

impl PriceHistoryDB {
    pub fn rows(item: &ItemMetadata, currency: &str, points: &[HistoryPoint]) -> Result<Vec<Self>> {
        let columns = ItemColumns::new(item)?;
        Ok(points
            .iter()
            .map(|point| Self {
                series_key: columns.series_key.clone(),
                time: format_timestamp(point.timestamp),
                appid: columns.appid,
                market_hash_name: columns.market_hash_name.clone(),
                item_nameid: columns.item_nameid,
                currency: currency.to_string(),
                country: columns.country.clone(),
                language: columns.language.clone(),
                price: point.price.to_string(),
                volume: point.volume,
            })
            .collect())
    }
}
