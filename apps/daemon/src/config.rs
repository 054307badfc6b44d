use std::path::PathBuf;

use steamtrack_core::scheduler::DEFAULT_MINUTE_OFFSET;
use steamtrack_core::DEFAULT_HISTORY_BATCH_SIZE;

/// Process settings read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// YAML file with `LIMITS` and `TRACKING_ITEMS`.
    pub config_path: PathBuf,
    pub db_path: String,
    pub history_batch_size: usize,
    /// Minute of the UTC hour at which price history is refreshed.
    pub history_minute: u32,
    /// Market host override, e.g. a local replay server.
    pub market_url: Option<String>,
    /// Local copy of the CS2 `item_nameid` catalog.
    pub item_ids_cache: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config_path = lookup("STEAMTRACK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.yaml"));
        let db_path = lookup("STEAMTRACK_DB_PATH").unwrap_or_else(|| "market_data.db".to_string());
        let history_batch_size = lookup("STEAMTRACK_HISTORY_BATCH")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_HISTORY_BATCH_SIZE);
        let history_minute = lookup("STEAMTRACK_HISTORY_MINUTE")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|minute| *minute < 60)
            .unwrap_or(DEFAULT_MINUTE_OFFSET);
        let market_url = lookup("STEAMTRACK_MARKET_URL").filter(|url| !url.trim().is_empty());
        let item_ids_cache = lookup("STEAMTRACK_ITEM_IDS_CACHE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("cache/cs2_item_ids.json"));

        Self {
            config_path,
            db_path,
            history_batch_size,
            history_minute,
            market_url,
            item_ids_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.config_path, PathBuf::from("config.yaml"));
        assert_eq!(config.db_path, "market_data.db");
        assert_eq!(config.history_batch_size, 50);
        assert_eq!(config.history_minute, 30);
        assert_eq!(config.market_url, None);
        assert_eq!(config.item_ids_cache, PathBuf::from("cache/cs2_item_ids.json"));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("STEAMTRACK_CONFIG", "/etc/steamtrack.yaml"),
            ("STEAMTRACK_DB_PATH", "/var/lib/steamtrack/market.db"),
            ("STEAMTRACK_HISTORY_BATCH", "200"),
            ("STEAMTRACK_HISTORY_MINUTE", "5"),
            ("STEAMTRACK_MARKET_URL", "http://127.0.0.1:8080"),
            ("STEAMTRACK_ITEM_IDS_CACHE", "/var/cache/steamtrack/cs2.json"),
        ]);
        assert_eq!(config.config_path, PathBuf::from("/etc/steamtrack.yaml"));
        assert_eq!(config.db_path, "/var/lib/steamtrack/market.db");
        assert_eq!(config.history_batch_size, 200);
        assert_eq!(config.history_minute, 5);
        assert_eq!(config.market_url.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(config.item_ids_cache, PathBuf::from("/var/cache/steamtrack/cs2.json"));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = config(&[
            ("STEAMTRACK_HISTORY_BATCH", "0"),
            ("STEAMTRACK_HISTORY_MINUTE", "75"),
        ]);
        assert_eq!(config.history_batch_size, 50);
        assert_eq!(config.history_minute, 30);
    }
}
