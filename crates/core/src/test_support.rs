//! Hand-written collaborators shared by the unit tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use steamtrack_market_data::{
    EndpointKind, FetchError, HistoryPoint, ItemParams, MarketFetcher, MarketPayload, OrderBook,
    OrdersActivity, PriceHistory, PriceOverview, RawHistoryPoint, SeriesKey,
};

use crate::errors::{Error, Result};
use crate::store::{ItemMetadata, MarketDataStore};

// =========================================================================
// Mock MarketDataStore
// =========================================================================

#[derive(Clone, Default)]
pub struct MockMarketStore {
    /// (series key, timestamp) -> (currency, point)
    history: Arc<Mutex<BTreeMap<(String, DateTime<Utc>), (String, HistoryPoint)>>>,
    batches: Arc<Mutex<Vec<Vec<DateTime<Utc>>>>>,
    snapshots: Arc<Mutex<Vec<EndpointKind>>>,
    fail_on_save: Arc<Mutex<bool>>,
}

impl MockMarketStore {
    pub fn seed_history(&self, item: &ItemMetadata, points: &[HistoryPoint]) {
        let mut history = self.history.lock().unwrap();
        for point in points {
            history.insert(
                (item.key.to_string(), point.timestamp),
                ("USD".to_string(), point.clone()),
            );
        }
    }

    pub fn history_timestamps(&self, key: &SeriesKey) -> Vec<DateTime<Utc>> {
        self.history
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, _)| k == key.as_str())
            .map(|(_, ts)| *ts)
            .collect()
    }

    pub fn history_currency(&self, key: &SeriesKey) -> Option<String> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .find(|((k, _), _)| k == key.as_str())
            .map(|(_, (currency, _))| currency.clone())
    }

    pub fn history_batches(&self) -> Vec<Vec<DateTime<Utc>>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn snapshots(&self) -> Vec<EndpointKind> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn set_fail_on_save(&self, fail: bool) {
        *self.fail_on_save.lock().unwrap() = fail;
    }

    fn record_snapshot(&self, kind: EndpointKind) -> Result<()> {
        if *self.fail_on_save.lock().unwrap() {
            return Err(Error::Unexpected("Intentional save failure".into()));
        }
        self.snapshots.lock().unwrap().push(kind);
        Ok(())
    }
}

#[async_trait]
impl MarketDataStore for MockMarketStore {
    async fn save_price_overview(&self, _item: &ItemMetadata, _data: &PriceOverview) -> Result<()> {
        self.record_snapshot(EndpointKind::PriceOverview)
    }

    async fn save_order_book(&self, _item: &ItemMetadata, _data: &OrderBook) -> Result<()> {
        self.record_snapshot(EndpointKind::OrderBook)
    }

    async fn save_activity(&self, _item: &ItemMetadata, _data: &OrdersActivity) -> Result<()> {
        self.record_snapshot(EndpointKind::Activity)
    }

    async fn last_history_timestamp(&self, key: &SeriesKey) -> Result<Option<DateTime<Utc>>> {
        Ok(self.history_timestamps(key).into_iter().max())
    }

    async fn insert_history(
        &self,
        item: &ItemMetadata,
        currency: &str,
        points: &[HistoryPoint],
    ) -> Result<usize> {
        if *self.fail_on_save.lock().unwrap() {
            return Err(Error::Unexpected("Intentional save failure".into()));
        }
        let mut history = self.history.lock().unwrap();
        let mut inserted = 0;
        for point in points {
            let key = (item.key.to_string(), point.timestamp);
            if !history.contains_key(&key) {
                history.insert(key, (currency.to_string(), point.clone()));
                inserted += 1;
            }
        }
        self.batches
            .lock()
            .unwrap()
            .push(points.iter().map(|p| p.timestamp).collect());
        Ok(inserted)
    }
}

// =========================================================================
// Scripted MarketFetcher
// =========================================================================

/// A canned fetch response.
#[derive(Clone, Debug)]
pub enum Scripted {
    Payload(MarketPayload),
    /// Non-success HTTP status
    Status(u16),
    /// Transport failure
    Network,
    /// Malformed payload
    Invalid,
}

#[derive(Clone, Debug)]
pub struct FetchCall {
    pub kind: EndpointKind,
    pub name: String,
    pub at: Instant,
}

/// Fetcher that replays queued responses per (endpoint, item) and succeeds
/// with a sample payload once the queue is empty.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    scripts: Arc<Mutex<HashMap<(EndpointKind, String), VecDeque<Scripted>>>>,
    fallback: Arc<Mutex<HashMap<(EndpointKind, String), Scripted>>>,
    calls: Arc<Mutex<Vec<FetchCall>>>,
    latency: Arc<Mutex<Option<Duration>>>,
}

impl ScriptedFetcher {
    /// Make every fetch take `latency` after it is recorded.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn push(&self, kind: EndpointKind, name: &str, response: Scripted) {
        self.scripts
            .lock()
            .unwrap()
            .entry((kind, name.to_string()))
            .or_default()
            .push_back(response);
    }

    /// Response used once the queue for (kind, name) is empty.
    pub fn always(&self, kind: EndpointKind, name: &str, response: Scripted) {
        self.fallback
            .lock()
            .unwrap()
            .insert((kind, name.to_string()), response);
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_times(&self, name: &str) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter(|call| call.name == name)
            .map(|call| call.at)
            .collect()
    }
}

#[async_trait]
impl MarketFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        kind: EndpointKind,
        params: &ItemParams,
    ) -> std::result::Result<MarketPayload, FetchError> {
        let name = params.market_hash_name.clone();
        self.calls.lock().unwrap().push(FetchCall {
            kind,
            name: name.clone(),
            at: Instant::now(),
        });

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let key = (kind, name);
        let queued = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        let response = queued
            .or_else(|| self.fallback.lock().unwrap().get(&key).cloned())
            .unwrap_or_else(|| Scripted::Payload(sample_payload(kind)));

        match response {
            Scripted::Payload(payload) => Ok(payload),
            Scripted::Status(status) => Err(FetchError::from_status(kind, status)),
            Scripted::Network => Err(FetchError::Network {
                endpoint: kind,
                message: "connection reset".to_string(),
            }),
            Scripted::Invalid => Err(FetchError::Validation {
                endpoint: kind,
                message: "missing field `success`".to_string(),
            }),
        }
    }
}

/// A successful payload of the given kind.
pub fn sample_payload(kind: EndpointKind) -> MarketPayload {
    match kind {
        EndpointKind::PriceOverview => MarketPayload::PriceOverview(PriceOverview {
            success: true,
            lowest_price: Some("$0.05".to_string()),
            median_price: Some("$0.06".to_string()),
            volume: Some("1,234".to_string()),
        }),
        EndpointKind::OrderBook => MarketPayload::OrderBook(OrderBook {
            success: true,
            sell_order_count: Some(10),
            sell_order_price: Some("$0.06".to_string()),
            sell_order_table: None,
            buy_order_count: Some(20),
            buy_order_price: Some("$0.04".to_string()),
            buy_order_table: None,
            highest_buy_order: Some("4".to_string()),
            lowest_sell_order: Some("6".to_string()),
            buy_order_graph: Vec::new(),
            sell_order_graph: Vec::new(),
            graph_max_y: None,
            graph_min_x: None,
            graph_max_x: None,
            price_prefix: "$".to_string(),
            price_suffix: String::new(),
        }),
        EndpointKind::Activity => MarketPayload::Activity(OrdersActivity {
            success: true,
            activity: Vec::new(),
            timestamp: 1_700_000_000,
            parsed_activities: Vec::new(),
        }),
        EndpointKind::PriceHistory => MarketPayload::PriceHistory(PriceHistory {
            success: true,
            price_prefix: "$".to_string(),
            price_suffix: String::new(),
            prices: vec![
                RawHistoryPoint::new("Jan 01 2024 01: +0", 1.5, "3"),
                RawHistoryPoint::new("Jan 01 2024 02: +0", 1.6, "4"),
            ],
        }),
    }
}
