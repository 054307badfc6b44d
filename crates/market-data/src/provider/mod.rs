//! Remote fetch abstraction and the Steam Community Market implementation.
//!
//! This module contains:
//! - The `MarketFetcher` trait the schedulers fetch through
//! - `SteamMarketClient`, the reqwest-backed implementation
//!
//! Fetchers never rate limit themselves. Callers acquire a token from the
//! shared [`RateLimiter`](crate::RateLimiter) before every call so that all
//! schedulers draw from one budget.

mod traits;

pub mod steam;

pub use traits::MarketFetcher;
