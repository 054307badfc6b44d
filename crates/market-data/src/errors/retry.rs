/// Classification for retry policy.
///
/// Used by the schedulers to decide how an item reacts to a failed fetch.
///
/// # Behavior Summary
///
/// | Class | Backoff state touched? | Retried when? |
/// |-------|------------------------|---------------|
/// | `WithBackoff` | Yes (cooldown / retry delay) | after the backoff delay |
/// | `SkipCycle` | No | next time the item is due |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Retry after a backoff delay.
    ///
    /// Used for rate limiting (429), server errors (5xx), transport failures
    /// and authentication failures. Session cookies can be rotated while the
    /// process runs, so an auth failure is not treated as permanent.
    WithBackoff,

    /// Give up on the item for the current cycle only.
    ///
    /// Used for other client errors and payloads that fail validation.
    /// Retrying immediately would fail the same way.
    SkipCycle,
}
