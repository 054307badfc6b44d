//! Wall-clock time source.
//!
//! Interval and backoff math uses the monotonic `tokio::time::Instant`. Only
//! the fixed-time scheduler needs calendar time, to align runs to a minute of
//! the UTC hour, and it reads it through [`WallClock`].

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::Instant;

/// Source of the current UTC time.
pub trait WallClock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A wall clock that advances with the tokio clock from a fixed start.
///
/// Under a paused tokio runtime this clock moves only when tokio time does,
/// which makes hour-aligned scheduling deterministic.
#[derive(Clone, Copy, Debug)]
pub struct AnchoredWallClock {
    anchor_utc: DateTime<Utc>,
    anchor: Instant,
}

impl AnchoredWallClock {
    /// Start the clock at `start`, as of the current tokio instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            anchor_utc: start,
            anchor: Instant::now(),
        }
    }
}

impl WallClock for AnchoredWallClock {
    fn now_utc(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.anchor.elapsed())
            .ok()
            .and_then(|elapsed| self.anchor_utc.checked_add_signed(elapsed))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
