use std::fmt;

use serde::{Deserialize, Serialize};

use super::endpoint::EndpointKind;

/// Default Steam currency id (USD).
pub const DEFAULT_CURRENCY: u32 = 1;

/// Default country code sent with every request.
pub const DEFAULT_COUNTRY: &str = "US";

/// Default response language.
pub const DEFAULT_LANGUAGE: &str = "english";

/// Request parameters identifying one item on the market.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemParams {
    /// Steam application id (730 for CS2)
    pub appid: u32,

    /// Canonical market name of the item
    pub market_hash_name: String,

    /// Numeric listing id, required by the order book and activity endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_nameid: Option<u64>,

    /// Steam currency id
    pub currency: u32,

    /// Two-letter country code
    pub country: String,

    /// Response language
    pub language: String,
}

impl ItemParams {
    /// Create params with the default currency, country and language.
    pub fn new(appid: u32, market_hash_name: impl Into<String>) -> Self {
        Self {
            appid,
            market_hash_name: market_hash_name.into(),
            item_nameid: None,
            currency: DEFAULT_CURRENCY,
            country: DEFAULT_COUNTRY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Set the numeric listing id.
    pub fn with_item_nameid(mut self, item_nameid: u64) -> Self {
        self.item_nameid = Some(item_nameid);
        self
    }
}

/// Stable identity of one persisted series: app, item and endpoint.
///
/// Rendered as `"{appid}:{market_hash_name}:{endpoint}"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesKey(String);

impl SeriesKey {
    pub fn new(params: &ItemParams, kind: EndpointKind) -> Self {
        Self(format!(
            "{}:{}:{}",
            params.appid, params.market_hash_name, kind
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SeriesKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
