//! Market data models
//!
//! This module contains the core data types for market data operations:
//! - `endpoint` - The closed set of remote endpoints (EndpointKind)
//! - `item` - Per-item request parameters and the persistent series identity
//! - `payload` - Decoded responses for each endpoint (MarketPayload)
//! - `history` - Raw and parsed price history points

mod endpoint;
mod history;
mod item;
mod payload;

pub use endpoint::EndpointKind;
pub use history::{HistoryPoint, RawHistoryPoint};
pub use item::{ItemParams, SeriesKey};
pub use payload::{
    ActivityEntry, MarketPayload, OrderBook, OrderBookEntry, OrdersActivity, PriceHistory,
    PriceOverview,
};
