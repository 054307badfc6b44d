//! Steamtrack Market Data Crate
//!
//! This crate fetches item data from the Steam Community Market and owns the
//! process-wide request budget.
//!
//! # Overview
//!
//! The market data crate provides:
//! - A sliding window rate limiter shared by every caller
//! - Typed payloads for the four market endpoints
//! - A failure taxonomy with retry classification
//! - Parsers for the market's locale-formatted prices, volumes and dates
//! - A cached `item_nameid` catalog for order book and activity items
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |    Scheduler     | --> |   RateLimiter    |  (one per process)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |  MarketFetcher   | --> | SteamMarketClient|  (reqwest)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+
//! |  MarketPayload   |  (or FetchError)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`EndpointKind`] - The four remote endpoints
//! - [`ItemParams`] - Per-item request parameters
//! - [`SeriesKey`] - Persistent identity of one tracked series
//! - [`MarketPayload`] - Decoded response of a successful fetch
//! - [`FetchError`] / [`FailureKind`] - Failed fetch classification
//! - [`RateLimiter`] / [`RateBudget`] - Shared request budget

pub mod errors;
pub mod models;
pub mod parse;
pub mod provider;
pub mod rate_limiter;

pub use errors::{FailureKind, FetchError, RetryClass};

pub use models::{
    ActivityEntry, EndpointKind, HistoryPoint, ItemParams, MarketPayload, OrderBook,
    OrderBookEntry, OrdersActivity, PriceHistory, PriceOverview, RawHistoryPoint, SeriesKey,
};

pub use provider::steam::{
    ItemNameIdLookup, ItemNameIds, NameIdCatalog, NameIdError, SteamMarketClient,
};
pub use provider::MarketFetcher;

pub use rate_limiter::{RateBudget, RateLimiter};
