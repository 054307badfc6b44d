//! Steam Community Market client.
//!
//! This module fetches the four public market endpoints:
//! - `priceoverview/` - lowest/median price snapshot
//! - `itemordershistogram` - buy/sell order book
//! - `itemordersactivity` - recent trade activity (HTML fragments in JSON)
//! - `pricehistory` - hourly price history (requires a logged-in session)
//!
//! The market allows roughly 15 requests per minute per IP. This client does
//! not throttle; callers share a [`RateLimiter`](crate::RateLimiter).

pub mod activity;
pub mod name_ids;

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, REFERER, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::FetchError;
use crate::models::{EndpointKind, ItemParams, MarketPayload, OrdersActivity};
use crate::provider::MarketFetcher;

pub use activity::{parse_activity_html, parse_activity_response};
pub use name_ids::{ItemNameIdLookup, ItemNameIds, NameIdCatalog, NameIdError};

const BASE_URL: &str = "https://steamcommunity.com/market";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser user agent; `pricehistory` rejects obvious non-browser clients.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

/// Session cookies forwarded to `pricehistory`, read from the environment
/// variable of the same name.
const SESSION_COOKIES: [&str; 4] = ["sessionid", "steamLoginSecure", "browserid", "steamCountry"];

// ============================================================================
// Request construction
// ============================================================================

/// Path segment of each endpoint under the market base URL.
fn endpoint_path(kind: EndpointKind) -> &'static str {
    match kind {
        // The overview endpoint 301s without the trailing slash
        EndpointKind::PriceOverview => "priceoverview/",
        EndpointKind::OrderBook => "itemordershistogram",
        EndpointKind::Activity => "itemordersactivity",
        EndpointKind::PriceHistory => "pricehistory",
    }
}

fn require_item_nameid(kind: EndpointKind, params: &ItemParams) -> Result<u64, FetchError> {
    params.item_nameid.ok_or_else(|| FetchError::Validation {
        endpoint: kind,
        message: format!("item_nameid is required for '{}'", params.market_hash_name),
    })
}

/// Query string for one request.
fn build_query(
    kind: EndpointKind,
    params: &ItemParams,
) -> Result<Vec<(&'static str, String)>, FetchError> {
    let locale = [
        ("currency", params.currency.to_string()),
        ("country", params.country.clone()),
        ("language", params.language.clone()),
    ];

    let mut query = match kind {
        EndpointKind::PriceOverview | EndpointKind::PriceHistory => vec![
            ("appid", params.appid.to_string()),
            ("market_hash_name", params.market_hash_name.clone()),
        ],
        EndpointKind::OrderBook => vec![
            ("norender", "1".to_string()),
            ("appid", params.appid.to_string()),
            ("item_nameid", require_item_nameid(kind, params)?.to_string()),
        ],
        EndpointKind::Activity => vec![
            ("item_nameid", require_item_nameid(kind, params)?.to_string()),
            ("two_factor", "0".to_string()),
        ],
    };
    query.extend(locale);
    Ok(query)
}

/// `Cookie` header value built from whichever session cookies `lookup`
/// can supply.
fn session_cookie_header<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let pairs: Vec<String> = SESSION_COOKIES
        .iter()
        .filter_map(|name| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .map(|value| format!("{}={}", name, value))
        })
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

fn listing_referer(params: &ItemParams) -> String {
    format!(
        "https://steamcommunity.com/market/listings/{}/{}",
        params.appid,
        encode(&params.market_hash_name)
    )
}

// ============================================================================
// SteamMarketClient
// ============================================================================

/// Steam Community Market fetcher.
pub struct SteamMarketClient {
    client: Client,
    base_url: String,
}

impl SteamMarketClient {
    /// Create a client for the public market.
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Create a client against a different host, e.g. a local replay server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, kind: EndpointKind, params: &ItemParams) -> Result<RequestBuilder, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint_path(kind));
        let mut request = self.client.get(&url).query(&build_query(kind, params)?);

        if kind == EndpointKind::PriceHistory {
            // Read on every call so rotated cookies apply without a restart
            match session_cookie_header(|name| env::var(name).ok()) {
                Some(cookies) => request = request.header(COOKIE, cookies),
                None => warn!(
                    "No Steam session cookies set; pricehistory for '{}' will likely be rejected",
                    params.market_hash_name
                ),
            }
            request = request
                .header(USER_AGENT, BROWSER_USER_AGENT)
                .header(REFERER, listing_referer(params));
        }

        Ok(request)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, kind: EndpointKind, request: RequestBuilder) -> Result<String, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(kind, &e))?;

        let status = response.status();
        if !status.is_success() {
            debug!("Steam {} returned HTTP {}", kind, status);
            return Err(FetchError::from_status(kind, status.as_u16()));
        }

        // itemordersactivity serves JSON as text/html, so always decode from text
        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(kind, &e))
    }

    fn decode<T: DeserializeOwned>(kind: EndpointKind, body: &str) -> Result<T, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::Validation {
            endpoint: kind,
            message: format!("Failed to parse response: {}", e),
        })
    }

    fn decode_payload(kind: EndpointKind, body: &str) -> Result<MarketPayload, FetchError> {
        let payload = match kind {
            EndpointKind::PriceOverview => MarketPayload::PriceOverview(Self::decode(kind, body)?),
            EndpointKind::OrderBook => MarketPayload::OrderBook(Self::decode(kind, body)?),
            EndpointKind::Activity => {
                let mut activity: OrdersActivity = Self::decode(kind, body)?;
                activity.parsed_activities = parse_activity_response(&activity);
                MarketPayload::Activity(activity)
            }
            EndpointKind::PriceHistory => MarketPayload::PriceHistory(Self::decode(kind, body)?),
        };

        if !payload.is_success() {
            return Err(FetchError::Validation {
                endpoint: kind,
                message: "response reported success = false".to_string(),
            });
        }
        Ok(payload)
    }
}

impl Default for SteamMarketClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketFetcher for SteamMarketClient {
    async fn fetch(
        &self,
        kind: EndpointKind,
        params: &ItemParams,
    ) -> Result<MarketPayload, FetchError> {
        let request = self.request(kind, params)?;
        debug!("Steam request: {} for '{}'", kind, params.market_hash_name);

        let body = self.send(kind, request).await?;
        Self::decode_payload(kind, &body)
    }
}
