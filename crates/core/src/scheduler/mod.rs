//! The two schedulers that drive tracked items.
//!
//! Live endpoints are polled by [`UrgencyScheduler`] at per-item cadences.
//! Archival price history is refreshed by [`FixedTimeScheduler`] once per
//! hour. Both draw from the same rate limiter through an
//! [`ItemExecutor`](crate::execution::ItemExecutor).

mod fixed_time;
mod urgency;

pub use fixed_time::{
    next_execution, CycleReport, FixedTimeScheduler, RetryPolicy, DEFAULT_MINUTE_OFFSET,
};
pub use urgency::{PassReport, UrgencyScheduler};
