use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::endpoint::EndpointKind;
use super::history::RawHistoryPoint;
use crate::parse::{extract_currency, parse_steam_price, parse_volume};

// ============================================================================
// Lenient field decoding
// ============================================================================

/// The market reports success as `true` on some endpoints and `1` on others.
fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

/// Order counts arrive as numbers or as formatted strings ("1,234").
fn count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Int(n)) => Some(n),
        Some(Count::Text(text)) => parse_volume(&text),
        None => None,
    })
}

// ============================================================================
// priceoverview
// ============================================================================

/// Snapshot of the current listing price for an item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceOverview {
    #[serde(deserialize_with = "bool_or_int")]
    pub success: bool,
    /// Current lowest listing price, formatted ("0,03€")
    #[serde(default)]
    pub lowest_price: Option<String>,
    /// Recent median sale price, formatted
    #[serde(default)]
    pub median_price: Option<String>,
    /// Recent sales volume, formatted ("1,234")
    #[serde(default)]
    pub volume: Option<String>,
}

impl PriceOverview {
    pub fn lowest_price_value(&self) -> Option<Decimal> {
        self.lowest_price.as_deref().and_then(parse_steam_price)
    }

    pub fn median_price_value(&self) -> Option<Decimal> {
        self.median_price.as_deref().and_then(parse_steam_price)
    }

    pub fn volume_value(&self) -> Option<i64> {
        self.volume.as_deref().and_then(parse_volume)
    }

    /// ISO currency inferred from the formatted prices.
    pub fn currency(&self) -> Option<&'static str> {
        self.lowest_price
            .as_deref()
            .or(self.median_price.as_deref())
            .and_then(extract_currency)
    }
}

// ============================================================================
// itemordershistogram
// ============================================================================

/// One price level of the order book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    pub price: String,
    pub quantity: String,
}

/// Buy and sell order book for an item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(deserialize_with = "bool_or_int")]
    pub success: bool,
    #[serde(default, deserialize_with = "count")]
    pub sell_order_count: Option<i64>,
    #[serde(default)]
    pub sell_order_price: Option<String>,
    #[serde(default)]
    pub sell_order_table: Option<Vec<OrderBookEntry>>,
    #[serde(default, deserialize_with = "count")]
    pub buy_order_count: Option<i64>,
    #[serde(default)]
    pub buy_order_price: Option<String>,
    #[serde(default)]
    pub buy_order_table: Option<Vec<OrderBookEntry>>,
    #[serde(default)]
    pub highest_buy_order: Option<String>,
    #[serde(default)]
    pub lowest_sell_order: Option<String>,
    /// `[price, cumulative quantity, label]` triples
    #[serde(default)]
    pub buy_order_graph: Vec<serde_json::Value>,
    #[serde(default)]
    pub sell_order_graph: Vec<serde_json::Value>,
    #[serde(default)]
    pub graph_max_y: Option<f64>,
    #[serde(default)]
    pub graph_min_x: Option<f64>,
    #[serde(default)]
    pub graph_max_x: Option<f64>,
    #[serde(default)]
    pub price_prefix: String,
    #[serde(default)]
    pub price_suffix: String,
}

impl OrderBook {
    pub fn highest_buy_value(&self) -> Option<Decimal> {
        self.highest_buy_order.as_deref().and_then(parse_steam_price)
    }

    pub fn lowest_sell_value(&self) -> Option<Decimal> {
        self.lowest_sell_order.as_deref().and_then(parse_steam_price)
    }

    /// ISO currency inferred from the price suffix or the buy price.
    pub fn currency(&self) -> Option<&'static str> {
        extract_currency(&self.price_suffix)
            .or_else(|| extract_currency(&self.price_prefix))
            .or_else(|| self.buy_order_price.as_deref().and_then(extract_currency))
    }
}

// ============================================================================
// itemordersactivity
// ============================================================================

/// A single trade event parsed out of the activity HTML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    /// "Purchased", "Listed", ...
    pub action: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub raw_html: String,
}

/// Recent trade activity for an item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrdersActivity {
    #[serde(deserialize_with = "bool_or_int")]
    pub success: bool,
    /// Raw HTML fragments, one per event
    #[serde(default)]
    pub activity: Vec<String>,
    /// Unix timestamp of the response
    pub timestamp: i64,
    /// Structured entries, filled in after decoding
    #[serde(default)]
    pub parsed_activities: Vec<ActivityEntry>,
}

impl OrdersActivity {
    pub fn currency(&self) -> Option<&str> {
        self.parsed_activities
            .first()
            .and_then(|entry| entry.currency.as_deref())
    }
}

// ============================================================================
// pricehistory
// ============================================================================

/// Hourly price history for an item.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PriceHistory {
    #[serde(deserialize_with = "bool_or_int")]
    pub success: bool,
    #[serde(default)]
    pub price_prefix: String,
    #[serde(default)]
    pub price_suffix: String,
    /// Oldest first, as returned by the market
    #[serde(default)]
    pub prices: Vec<RawHistoryPoint>,
}

impl PriceHistory {
    pub fn currency(&self) -> Option<&'static str> {
        extract_currency(&self.price_suffix).or_else(|| extract_currency(&self.price_prefix))
    }
}

// ============================================================================
// MarketPayload
// ============================================================================

/// The decoded result of a successful fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum MarketPayload {
    PriceOverview(PriceOverview),
    OrderBook(OrderBook),
    Activity(OrdersActivity),
    PriceHistory(PriceHistory),
}

impl MarketPayload {
    pub fn kind(&self) -> EndpointKind {
        match self {
            MarketPayload::PriceOverview(_) => EndpointKind::PriceOverview,
            MarketPayload::OrderBook(_) => EndpointKind::OrderBook,
            MarketPayload::Activity(_) => EndpointKind::Activity,
            MarketPayload::PriceHistory(_) => EndpointKind::PriceHistory,
        }
    }

    /// Whether the market flagged the response as successful.
    pub fn is_success(&self) -> bool {
        match self {
            MarketPayload::PriceOverview(p) => p.success,
            MarketPayload::OrderBook(p) => p.success,
            MarketPayload::Activity(p) => p.success,
            MarketPayload::PriceHistory(p) => p.success,
        }
    }
}
