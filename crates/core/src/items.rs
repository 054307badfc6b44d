//! Tracked items and their scheduling state.
//!
//! A [`TrackedItem`] is owned by exactly one scheduler for its whole life and
//! is only mutated by that scheduler's loop, so it needs no synchronization.

use std::time::Duration;

use tokio::time::Instant;

use steamtrack_market_data::{EndpointKind, ItemParams, SeriesKey};

use crate::store::ItemMetadata;

/// Cap on the backoff multiplier applied to an item's interval.
pub const MAX_BACKOFF_MULTIPLIER: u32 = 8;

/// Backoff multiplier after `failures` consecutive failures:
/// `min(2^(failures - 1), 8)`.
pub fn backoff_multiplier(failures: u32) -> u32 {
    let exponent = failures.saturating_sub(1).min(31);
    (1u32 << exponent).min(MAX_BACKOFF_MULTIPLIER)
}

/// One endpoint of one item, plus the state its scheduler keeps for it.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedItem {
    pub key: SeriesKey,
    pub kind: EndpointKind,
    pub params: ItemParams,
    /// Target refresh interval. Always positive.
    pub interval: Duration,
    /// Last successful refresh. `None` until the first one.
    pub last_update: Option<Instant>,
    /// Backoff after a retryable failure; the item is not executed before
    /// this instant.
    pub cooldown_until: Option<Instant>,
    /// End of a cycle skipped after a non-retryable failure.
    pub skip_until: Option<Instant>,
    pub consecutive_failures: u32,
}

impl TrackedItem {
    pub fn new(kind: EndpointKind, params: ItemParams, interval: Duration) -> Self {
        Self {
            key: SeriesKey::new(&params, kind),
            kind,
            params,
            interval,
            last_update: None,
            cooldown_until: None,
            skip_until: None,
            consecutive_failures: 0,
        }
    }

    pub fn metadata(&self) -> ItemMetadata {
        ItemMetadata {
            key: self.key.clone(),
            kind: self.kind,
            params: self.params.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.params.market_hash_name
    }

    pub fn is_cooling(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// The later of the cooldown and skip deadlines, if still ahead of `now`.
    fn held_until(&self, now: Instant) -> Option<Instant> {
        self.cooldown_until
            .into_iter()
            .chain(self.skip_until)
            .filter(|until| now < *until)
            .max()
    }

    /// How overdue the item is, in units of its interval.
    ///
    /// Zero while cooling down or skipped, infinite before the first refresh,
    /// otherwise `elapsed / interval`. The item is due once this reaches 1.0.
    pub fn urgency(&self, now: Instant) -> f64 {
        if self.held_until(now).is_some() {
            return 0.0;
        }
        match self.last_update {
            None => f64::INFINITY,
            Some(last) => {
                now.saturating_duration_since(last).as_secs_f64() / self.interval.as_secs_f64()
            }
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.urgency(now) >= 1.0
    }

    /// Time until the item becomes due: the end of its cooldown or skipped
    /// cycle, or the end of its current interval.
    pub fn time_until_due(&self, now: Instant) -> Duration {
        if let Some(until) = self.held_until(now) {
            return until - now;
        }
        match self.last_update {
            None => Duration::ZERO,
            Some(last) => (last + self.interval).saturating_duration_since(now),
        }
    }

    /// Clear failure state after a successful refresh.
    pub fn record_success(&mut self, now: Instant) {
        self.last_update = Some(now);
        self.cooldown_until = None;
        self.skip_until = None;
        self.consecutive_failures = 0;
    }

    /// Count a retryable failure and start a cooldown of
    /// `interval * min(2^(n-1), 8)`. Returns the cooldown length.
    pub fn record_backoff(&mut self, now: Instant) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let cooldown = self.interval * backoff_multiplier(self.consecutive_failures);
        self.cooldown_until = Some(now + cooldown);
        cooldown
    }

    /// Skip the item for one interval. Backoff state and `last_update` are
    /// left as they are.
    pub fn record_skip(&mut self, now: Instant) {
        self.skip_until = Some(now + self.interval);
    }
}
