//! SQLite storage implementation for Steamtrack.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the [`MarketDataStore`](steamtrack_core::MarketDataStore) trait defined
//! in `steamtrack-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The market data repository and its Diesel row types
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies exist.
//! `core` works with traits only.
//!
//! ```text
//!          core (scheduling)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod market_data;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use market_data::MarketDataRepository;

// Re-export from steamtrack-core for convenience
pub use steamtrack_core::errors::{DatabaseError, Error, Result};
