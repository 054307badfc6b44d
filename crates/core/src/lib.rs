//! Steamtrack Core - scheduling, supervision and incremental persistence.
//!
//! This crate decides *when* market data is fetched and *what* gets written.
//! It is storage-agnostic: persistence goes through [`MarketDataStore`],
//! which the `storage-sqlite` crate implements, and fetching goes through
//! `steamtrack_market_data::MarketFetcher`.
//!
//! ```text
//!                 Orchestrator
//!                /            \
//!   UrgencyScheduler      FixedTimeScheduler
//!                \            /
//!                 ItemExecutor ── RateLimiter (shared)
//!                /            \
//!        MarketFetcher     DeltaMerge ── MarketDataStore
//! ```

pub mod clock;
pub mod config;
pub mod delta_merge;
pub mod errors;
pub mod execution;
pub mod items;
pub mod orchestrator;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod test_support;

pub use clock::{AnchoredWallClock, SystemWallClock, WallClock};
pub use config::TrackerConfig;
pub use delta_merge::{compute_delta, merge_history, MergeOutcome, DEFAULT_HISTORY_BATCH_SIZE};
pub use execution::{ExecutionError, ExecutionOutcome, ItemExecutor, StoredSummary};
pub use items::{backoff_multiplier, TrackedItem};
pub use orchestrator::{check_feasibility, Orchestrator};
pub use scheduler::{FixedTimeScheduler, RetryPolicy, UrgencyScheduler};
pub use store::{ItemMetadata, MarketDataStore};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
