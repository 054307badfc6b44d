//! SQLite storage implementation for market data.

mod model;
mod repository;

pub use model::{
    format_timestamp, parse_timestamp, NewActivityDB, NewOrderBookDB, NewPriceOverviewDB,
    PriceHistoryDB, TIMESTAMP_FORMAT,
};
pub use repository::MarketDataRepository;

// Re-export trait from core for convenience
pub use steamtrack_core::MarketDataStore;
