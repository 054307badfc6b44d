use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The remote endpoints an item can be tracked on.
///
/// Serialized as the path segment the market uses for the endpoint, which is
/// also what configuration files name them by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointKind {
    /// Current lowest/median price snapshot.
    #[serde(rename = "priceoverview")]
    PriceOverview,
    /// Buy/sell order book histogram.
    #[serde(rename = "itemordershistogram")]
    OrderBook,
    /// Recent trade activity log.
    #[serde(rename = "itemordersactivity")]
    Activity,
    /// Hourly price history series.
    #[serde(rename = "pricehistory")]
    PriceHistory,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 4] = [
        EndpointKind::PriceOverview,
        EndpointKind::OrderBook,
        EndpointKind::Activity,
        EndpointKind::PriceHistory,
    ];

    /// The endpoint's name as used in URLs and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::PriceOverview => "priceoverview",
            EndpointKind::OrderBook => "itemordershistogram",
            EndpointKind::Activity => "itemordersactivity",
            EndpointKind::PriceHistory => "pricehistory",
        }
    }

    /// Archival endpoints are refreshed on a fixed wall-clock schedule and
    /// persisted incrementally instead of polled by urgency.
    pub fn is_archival(&self) -> bool {
        matches!(self, EndpointKind::PriceHistory)
    }

    /// Whether requests to this endpoint need the numeric `item_nameid`.
    pub fn requires_item_nameid(&self) -> bool {
        matches!(self, EndpointKind::OrderBook | EndpointKind::Activity)
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EndpointKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown endpoint '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_history_is_archival() {
        assert!(EndpointKind::PriceHistory.is_archival());
        assert!(!EndpointKind::PriceOverview.is_archival());
        assert!(!EndpointKind::OrderBook.is_archival());
        assert!(!EndpointKind::Activity.is_archival());
    }

    #[test]
    fn test_from_str_matches_display() {
        for kind in EndpointKind::ALL {
            assert_eq!(kind.to_string().parse::<EndpointKind>(), Ok(kind));
        }
        assert!("histogram".parse::<EndpointKind>().is_err());
    }

    #[test]
    fn test_serde_uses_endpoint_names() {
        let json = serde_json::to_string(&EndpointKind::OrderBook).unwrap();
        assert_eq!(json, "\"itemordershistogram\"");

        let kind: EndpointKind = serde_json::from_str("\"pricehistory\"").unwrap();
        assert_eq!(kind, EndpointKind::PriceHistory);
    }
}
