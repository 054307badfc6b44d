//! Tracker configuration loaded from YAML.
//!
//! ```yaml
//! LIMITS:
//!   REQUESTS: 15
//!   WINDOW_SECONDS: 60
//! TRACKING_ITEMS:
//!   - market_hash_name: "AK-47 | Redline (Field-Tested)"
//!     appid: 730
//!     apiid: priceoverview
//!     polling-interval-in-seconds: 30
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use steamtrack_market_data::models::ItemParams;
use steamtrack_market_data::{EndpointKind, ItemNameIdLookup, RateBudget};

use crate::errors::{Error, Result};
use crate::items::TrackedItem;

/// Interval given to archival items that do not set one.
pub const DEFAULT_ARCHIVAL_INTERVAL: Duration = Duration::from_secs(3600);

const DEFAULT_APPID: u32 = 730;

/// Request budget section.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LimitsConfig {
    #[serde(rename = "REQUESTS")]
    pub requests: u32,
    #[serde(rename = "WINDOW_SECONDS")]
    pub window_seconds: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let budget = RateBudget::default();
        Self {
            requests: budget.max_requests,
            window_seconds: budget.window.as_secs(),
        }
    }
}

/// One entry of `TRACKING_ITEMS`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TrackingItemConfig {
    pub market_hash_name: String,
    #[serde(default = "default_appid")]
    pub appid: u32,
    pub apiid: EndpointKind,
    #[serde(rename = "polling-interval-in-seconds", default)]
    pub polling_interval_in_seconds: Option<f64>,
    #[serde(default)]
    pub item_nameid: Option<u64>,
    #[serde(default)]
    pub currency: Option<u32>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

fn default_appid() -> u32 {
    DEFAULT_APPID
}

impl TrackingItemConfig {
    fn params(&self) -> ItemParams {
        let mut params = ItemParams::new(self.appid, self.market_hash_name.clone());
        params.item_nameid = self.item_nameid;
        if let Some(currency) = self.currency {
            params.currency = currency;
        }
        if let Some(country) = &self.country {
            params.country = country.clone();
        }
        if let Some(language) = &self.language {
            params.language = language.clone();
        }
        params
    }

    /// Resolved polling interval. Errors if missing on a live item or not
    /// positive.
    fn interval(&self) -> Result<Duration> {
        let seconds = match self.polling_interval_in_seconds {
            Some(seconds) => seconds,
            None if self.apiid.is_archival() => return Ok(DEFAULT_ARCHIVAL_INTERVAL),
            None => {
                return Err(Error::InvalidConfigValue(format!(
                    "'{}' ({}) needs polling-interval-in-seconds",
                    self.market_hash_name, self.apiid
                )))
            }
        };

        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(Error::InvalidConfigValue(format!(
                "'{}' ({}) has non-positive polling interval {}",
                self.market_hash_name, self.apiid, seconds
            )));
        }
        Duration::try_from_secs_f64(seconds).map_err(|e| {
            Error::InvalidConfigValue(format!(
                "'{}' ({}) has invalid polling interval: {}",
                self.market_hash_name, self.apiid, e
            ))
        })
    }

    fn validate(&self) -> Result<()> {
        if self.market_hash_name.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "tracking item with empty market_hash_name".to_string(),
            ));
        }
        if self.apiid.requires_item_nameid() && self.item_nameid.is_none() {
            return Err(Error::InvalidConfigValue(format!(
                "'{}' ({}) needs item_nameid",
                self.market_hash_name, self.apiid
            )));
        }
        self.interval().map(|_| ())
    }
}

/// Top-level tracker configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TrackerConfig {
    #[serde(rename = "LIMITS", default)]
    pub limits: LimitsConfig,
    #[serde(rename = "TRACKING_ITEMS", default)]
    pub tracking_items: Vec<TrackingItemConfig>,
}

impl TrackerConfig {
    /// Read, parse and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML config file without validating it, so missing
    /// `item_nameid`s can be filled in first.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::ConfigIO(format!("{}: {}", path.display(), e)))?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: TrackerConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Whether an order book or activity item has no `item_nameid`.
    pub fn needs_item_nameids(&self) -> bool {
        self.tracking_items
            .iter()
            .any(|item| item.apiid.requires_item_nameid() && item.item_nameid.is_none())
    }

    /// Fill in missing `item_nameid`s of order book and activity items.
    ///
    /// Returns the names that could not be resolved; those items still fail
    /// validation.
    pub fn fill_item_nameids(&mut self, lookup: &dyn ItemNameIdLookup) -> Vec<String> {
        let mut unresolved = Vec::new();
        for item in self
            .tracking_items
            .iter_mut()
            .filter(|item| item.apiid.requires_item_nameid() && item.item_nameid.is_none())
        {
            match lookup.item_nameid(item.appid, &item.market_hash_name) {
                Some(id) => {
                    info!("Resolved item_nameid {} for '{}'", id, item.market_hash_name);
                    item.item_nameid = Some(id);
                }
                None => {
                    warn!("No item_nameid found for '{}'", item.market_hash_name);
                    unresolved.push(item.market_hash_name.clone());
                }
            }
        }
        unresolved
    }

    pub fn validate(&self) -> Result<()> {
        if self.limits.requests == 0 {
            return Err(Error::InvalidConfigValue(
                "LIMITS.REQUESTS must be positive".to_string(),
            ));
        }
        if self.limits.window_seconds == 0 {
            return Err(Error::InvalidConfigValue(
                "LIMITS.WINDOW_SECONDS must be positive".to_string(),
            ));
        }
        self.tracking_items.iter().try_for_each(TrackingItemConfig::validate)
    }

    pub fn budget(&self) -> RateBudget {
        RateBudget::new(
            self.limits.requests,
            Duration::from_secs(self.limits.window_seconds),
        )
    }

    /// Build fresh scheduling state for every configured item, in order.
    pub fn tracked_items(&self) -> Result<Vec<TrackedItem>> {
        self.tracking_items
            .iter()
            .map(|item| Ok(TrackedItem::new(item.apiid, item.params(), item.interval()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
LIMITS:
  REQUESTS: 15
  WINDOW_SECONDS: 60
TRACKING_ITEMS:
  - market_hash_name: "AK-47 | Redline (Field-Tested)"
    appid: 730
    apiid: priceoverview
    polling-interval-in-seconds: 30
  - market_hash_name: "Glove Case"
    appid: 730
    apiid: itemordershistogram
    polling-interval-in-seconds: 12.5
    item_nameid: 176288467
    currency: 3
    country: DE
    language: german
  - market_hash_name: "Glove Case"
    apiid: pricehistory
"#;

    #[test]
    fn test_parse_sample() {
        let config = TrackerConfig::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(config.budget(), RateBudget::new(15, Duration::from_secs(60)));
        assert_eq!(config.tracking_items.len(), 3);

        let items = config.tracked_items().unwrap();
        assert_eq!(items[0].kind, EndpointKind::PriceOverview);
        assert_eq!(items[0].interval, Duration::from_secs(30));
        assert_eq!(items[0].params.currency, 1);

        assert_eq!(items[1].interval, Duration::from_millis(12_500));
        assert_eq!(items[1].params.item_nameid, Some(176_288_467));
        assert_eq!(items[1].params.country, "DE");
        assert_eq!(items[1].params.language, "german");

        assert_eq!(items[2].kind, EndpointKind::PriceHistory);
        assert_eq!(items[2].params.appid, 730);
        assert_eq!(items[2].interval, DEFAULT_ARCHIVAL_INTERVAL);
    }

    #[test]
    fn test_missing_limits_use_defaults() {
        let config = TrackerConfig::from_yaml_str("TRACKING_ITEMS: []").unwrap();
        assert_eq!(config.budget(), RateBudget::default());
    }

    #[test]
    fn test_rejects_unknown_endpoint() {
        let yaml = r#"
TRACKING_ITEMS:
  - market_hash_name: "Glove Case"
    apiid: histogram
    polling-interval-in-seconds: 30
"#;
        assert!(matches!(
            TrackerConfig::from_yaml_str(yaml),
            Err(Error::InvalidConfigValue(_))
        ));
    }

    #[test]
    fn test_rejects_live_item_without_interval() {
        let yaml = r#"
TRACKING_ITEMS:
  - market_hash_name: "Glove Case"
    apiid: priceoverview
"#;
        assert!(TrackerConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        let yaml = r#"
TRACKING_ITEMS:
  - market_hash_name: "Glove Case"
    apiid: priceoverview
    polling-interval-in-seconds: 0
"#;
        assert!(TrackerConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_rejects_order_book_without_item_nameid() {
        let yaml = r#"
TRACKING_ITEMS:
  - market_hash_name: "Glove Case"
    apiid: itemordersactivity
    polling-interval-in-seconds: 30
"#;
        let err = TrackerConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("item_nameid"));
    }

    #[test]
    fn test_rejects_zero_budget() {
        let yaml = "LIMITS:\n  REQUESTS: 0\n  WINDOW_SECONDS: 60\n";
        assert!(TrackerConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = TrackerConfig::load(file.path()).unwrap();
        assert_eq!(config.tracking_items.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = TrackerConfig::load("/nonexistent/steamtrack.yaml").unwrap_err();
        assert!(matches!(err, Error::ConfigIO(_)));
    }

    struct FixedIds(Vec<(&'static str, u64)>);

    impl ItemNameIdLookup for FixedIds {
        fn item_nameid(&self, appid: u32, market_hash_name: &str) -> Option<u64> {
            if appid != 730 {
                return None;
            }
            self.0
                .iter()
                .find(|(name, _)| *name == market_hash_name)
                .map(|(_, id)| *id)
        }
    }

    const UNRESOLVED: &str = r#"
TRACKING_ITEMS:
  - market_hash_name: "Glove Case"
    apiid: itemordershistogram
    polling-interval-in-seconds: 30
  - market_hash_name: "Glove Case"
    apiid: itemordersactivity
    polling-interval-in-seconds: 30
    item_nameid: 42
  - market_hash_name: "Clutch Case"
    apiid: priceoverview
    polling-interval-in-seconds: 30
"#;

    #[test]
    fn test_missing_item_nameids_are_filled_from_lookup() {
        let mut config: TrackerConfig = serde_yaml::from_str(UNRESOLVED).unwrap();
        assert!(config.needs_item_nameids());

        let unresolved = config.fill_item_nameids(&FixedIds(vec![
            ("Glove Case", 176_288_467),
            ("Clutch Case", 176_928_214),
        ]));

        assert!(unresolved.is_empty());
        assert!(!config.needs_item_nameids());
        assert_eq!(config.tracking_items[0].item_nameid, Some(176_288_467));
        // Configured ids win and items that need none are left alone
        assert_eq!(config.tracking_items[1].item_nameid, Some(42));
        assert_eq!(config.tracking_items[2].item_nameid, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unresolved_item_nameid_still_fails_validation() {
        let mut config: TrackerConfig = serde_yaml::from_str(UNRESOLVED).unwrap();

        let unresolved = config.fill_item_nameids(&FixedIds(Vec::new()));

        assert_eq!(unresolved, vec!["Glove Case".to_string()]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("item_nameid"));
    }

    #[test]
    fn test_read_skips_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(UNRESOLVED.as_bytes()).unwrap();

        assert!(TrackerConfig::load(file.path()).is_err());
        let config = TrackerConfig::read(file.path()).unwrap();
        assert_eq!(config.tracking_items.len(), 3);
    }
}
