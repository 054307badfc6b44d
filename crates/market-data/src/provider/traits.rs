//! Market fetcher trait definition.

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::{EndpointKind, ItemParams, MarketPayload};

/// Trait for remote market data sources.
///
/// One call performs exactly one remote request. The returned payload's
/// [`kind`](MarketPayload::kind) always equals the requested `kind`.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use steamtrack_market_data::{EndpointKind, FetchError, ItemParams, MarketFetcher, MarketPayload};
///
/// struct ReplayFetcher {
///     payload: MarketPayload,
/// }
///
/// #[async_trait]
/// impl MarketFetcher for ReplayFetcher {
///     async fn fetch(
///         &self,
///         _kind: EndpointKind,
///         _params: &ItemParams,
///     ) -> Result<MarketPayload, FetchError> {
///         Ok(self.payload.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait MarketFetcher: Send + Sync {
    /// Fetch one endpoint for one item.
    ///
    /// Callers must have acquired a rate limiter token first.
    async fn fetch(
        &self,
        kind: EndpointKind,
        params: &ItemParams,
    ) -> Result<MarketPayload, FetchError>;
}
