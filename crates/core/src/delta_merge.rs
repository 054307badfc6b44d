//! Incremental persistence of price history.
//!
//! Each history fetch returns the full series, oldest first. Only the tail
//! newer than the persisted cursor (`MAX(time)` for the series) is written.
//! Inserts are insert-or-ignore, so overlapping or repeated fetches never
//! duplicate rows.

use chrono::{DateTime, Utc};

use steamtrack_market_data::{HistoryPoint, PriceHistory, RawHistoryPoint};

use crate::errors::Result;
use crate::store::{ItemMetadata, MarketDataStore};

/// Default number of points per insert transaction.
pub const DEFAULT_HISTORY_BATCH_SIZE: usize = 50;

/// Currency assumed when the response carries no recognizable marker.
const FALLBACK_CURRENCY: &str = "USD";

/// Result of merging one history fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Points newer than the cursor.
    pub candidates: usize,
    /// Rows actually written.
    pub inserted: usize,
    /// The series cursor after the merge.
    pub newest: Option<DateTime<Utc>>,
}

/// Select the points newer than `stored_max`, in ascending order.
///
/// Scans newest to oldest and stops at the first point not newer than the
/// cursor. Points with malformed dates are skipped and do not stop the scan.
pub fn compute_delta(
    raw_points: &[RawHistoryPoint],
    stored_max: Option<DateTime<Utc>>,
) -> Vec<HistoryPoint> {
    let mut delta = Vec::new();

    for raw in raw_points.iter().rev() {
        let Some(timestamp) = raw.timestamp() else {
            continue;
        };
        if stored_max.is_some_and(|max| timestamp <= max) {
            break;
        }
        if let Some(point) = raw.parse() {
            delta.push(point);
        }
    }

    delta.reverse();
    delta
}

/// Persist the new tail of a history fetch.
///
/// Batches are written oldest first, each in its own transaction, so a
/// failure part way leaves the cursor at the last committed batch and the
/// next fetch resumes from there.
pub async fn merge_history(
    store: &dyn MarketDataStore,
    item: &ItemMetadata,
    payload: &PriceHistory,
    batch_size: usize,
) -> Result<MergeOutcome> {
    let cursor = store.last_history_timestamp(&item.key).await?;
    let delta = compute_delta(&payload.prices, cursor);
    let currency = payload.currency().unwrap_or(FALLBACK_CURRENCY);

    let mut inserted = 0;
    for batch in delta.chunks(batch_size.max(1)) {
        inserted += store.insert_history(item, currency, batch).await?;
    }

    Ok(MergeOutcome {
        candidates: delta.len(),
        inserted,
        newest: delta.last().map(|point| point.timestamp).or(cursor),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockMarketStore;
    use chrono::TimeZone;
    use steamtrack_market_data::{EndpointKind, ItemParams};

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    fn raw(h: u32) -> RawHistoryPoint {
        RawHistoryPoint::new(format!("Jan 01 2024 {:02}: +0", h), 1.0 + h as f64, "10")
    }

    fn history(points: Vec<RawHistoryPoint>) -> PriceHistory {
        PriceHistory {
            success: true,
            price_prefix: String::new(),
            price_suffix: "€".to_string(),
            prices: points,
        }
    }

    fn metadata() -> ItemMetadata {
        ItemMetadata::new(EndpointKind::PriceHistory, ItemParams::new(730, "Glove Case"))
    }

    #[test]
    fn test_delta_without_cursor_takes_everything() {
        let delta = compute_delta(&[raw(1), raw(2), raw(3)], None);
        let hours: Vec<_> = delta.iter().map(|p| p.timestamp).collect();
        assert_eq!(hours, vec![hour(1), hour(2), hour(3)]);
    }

    #[test]
    fn test_delta_stops_at_cursor() {
        let delta = compute_delta(&[raw(1), raw(2), raw(3), raw(4)], Some(hour(2)));
        let hours: Vec<_> = delta.iter().map(|p| p.timestamp).collect();
        assert_eq!(hours, vec![hour(3), hour(4)]);
    }

    #[test]
    fn test_delta_skips_malformed_dates() {
        let garbage = RawHistoryPoint::new("not a date", 9.9, "1");
        let delta = compute_delta(&[raw(1), raw(2), garbage, raw(3)], Some(hour(1)));
        let hours: Vec<_> = delta.iter().map(|p| p.timestamp).collect();
        assert_eq!(hours, vec![hour(2), hour(3)]);
    }

    #[test]
    fn test_delta_empty_when_up_to_date() {
        assert!(compute_delta(&[raw(1), raw(2)], Some(hour(2))).is_empty());
        assert!(compute_delta(&[], None).is_empty());
    }

    #[tokio::test]
    async fn test_merge_persists_only_new_points_once() {
        let store = MockMarketStore::default();
        let item = metadata();
        store.seed_history(&item, &[raw(0).parse().unwrap()]);

        let payload = history(vec![raw(0), raw(5), raw(10)]);

        let first = merge_history(&store, &item, &payload, DEFAULT_HISTORY_BATCH_SIZE)
            .await
            .unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.newest, Some(hour(10)));
        assert_eq!(
            store.history_timestamps(&item.key),
            vec![hour(0), hour(5), hour(10)]
        );

        let second = merge_history(&store, &item, &payload, DEFAULT_HISTORY_BATCH_SIZE)
            .await
            .unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.candidates, 0);
        assert_eq!(second.newest, Some(hour(10)));
    }

    #[tokio::test]
    async fn test_merge_writes_in_ascending_batches() {
        let store = MockMarketStore::default();
        let item = metadata();
        let payload = history((0..7).map(raw).collect());

        let outcome = merge_history(&store, &item, &payload, 3).await.unwrap();

        assert_eq!(outcome.inserted, 7);
        let batches = store.history_batches();
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 3, 1]);
        assert_eq!(batches[0][0], hour(0));
        assert_eq!(batches[2][0], hour(6));
        assert_eq!(store.history_currency(&item.key).as_deref(), Some("EUR"));
    }
}
