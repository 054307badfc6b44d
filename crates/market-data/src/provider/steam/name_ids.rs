//! `item_nameid` catalog.
//!
//! The order book and activity endpoints address items by their numeric
//! `item_nameid`, which the market does not expose through any API. A public
//! community-maintained map from `market_hash_name` to `item_nameid` exists
//! for CS2; it is downloaded once and cached on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use reqwest::Client;
use thiserror::Error;

/// App id of Counter-Strike 2.
pub const CS2_APPID: u32 = 730;

/// Raw JSON map of CS2 `market_hash_name` to `item_nameid`.
pub const CS2_ITEM_NAME_IDS_URL: &str =
    "https://raw.githubusercontent.com/somespecialone/steam-item-name-ids/master/data/cs2.json";

const CATALOG_TIMEOUT: Duration = Duration::from_secs(60);

/// Resolves `item_nameid`s by item name.
pub trait ItemNameIdLookup {
    fn item_nameid(&self, appid: u32, market_hash_name: &str) -> Option<u64>;
}

/// `item_nameid`s of one app, keyed by `market_hash_name`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemNameIds {
    appid: u32,
    ids: HashMap<String, u64>,
}

impl ItemNameIds {
    pub fn new(appid: u32, ids: HashMap<String, u64>) -> Self {
        Self { appid, ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl ItemNameIdLookup for ItemNameIds {
    fn item_nameid(&self, appid: u32, market_hash_name: &str) -> Option<u64> {
        if appid != self.appid {
            return None;
        }
        self.ids.get(market_hash_name).copied()
    }
}

#[derive(Error, Debug)]
pub enum NameIdError {
    #[error("Catalog cache I/O failed: {0}")]
    Cache(#[from] std::io::Error),

    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Catalog request returned HTTP {0}")]
    Status(u16),

    #[error("Catalog is not a name to id map: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Downloads the CS2 catalog, preferring a local cache file.
pub struct NameIdCatalog {
    client: Client,
    url: String,
    cache_path: PathBuf,
}

impl NameIdCatalog {
    pub fn cs2(cache_path: impl Into<PathBuf>) -> Self {
        let client = Client::builder()
            .timeout(CATALOG_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: CS2_ITEM_NAME_IDS_URL.to_string(),
            cache_path: cache_path.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Read the cached catalog, or download it and write the cache.
    ///
    /// A cache that cannot be written is logged and otherwise ignored.
    pub async fn load(&self) -> Result<ItemNameIds, NameIdError> {
        if tokio::fs::try_exists(&self.cache_path).await? {
            let bytes = tokio::fs::read(&self.cache_path).await?;
            let ids: HashMap<String, u64> = serde_json::from_slice(&bytes)?;
            debug!(
                "Loaded {} item_nameids from {}",
                ids.len(),
                self.cache_path.display()
            );
            return Ok(ItemNameIds::new(CS2_APPID, ids));
        }

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NameIdError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        let ids: HashMap<String, u64> = serde_json::from_slice(&bytes)?;
        debug!("Downloaded {} item_nameids from {}", ids.len(), self.url);

        if let Err(err) = self.write_cache(&bytes).await {
            warn!(
                "Could not cache item_nameids at {}: {}",
                self.cache_path.display(),
                err
            );
        }

        Ok(ItemNameIds::new(CS2_APPID, ids))
    }

    async fn write_cache(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(dir) = self.cache_path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        tokio::fs::write(&self.cache_path, bytes).await
    }
}
