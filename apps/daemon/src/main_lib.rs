use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use steamtrack_core::{Orchestrator, TrackerConfig};
use steamtrack_market_data::{NameIdCatalog, SteamMarketClient};
use steamtrack_storage_sqlite::{db, MarketDataRepository};

use crate::config::Config;

pub fn init_tracing() {
    let log_format = std::env::var("STEAMTRACK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Read the tracking configuration, filling in missing `item_nameid`s from
/// the catalog before validating it.
pub async fn load_tracker_config(
    config: &Config,
    catalog: &NameIdCatalog,
) -> anyhow::Result<TrackerConfig> {
    let mut tracker = TrackerConfig::read(&config.config_path)
        .with_context(|| format!("loading {}", config.config_path.display()))?;

    if tracker.needs_item_nameids() {
        match catalog.load().await {
            Ok(ids) => {
                tracker.fill_item_nameids(&ids);
            }
            Err(err) => tracing::warn!(
                "Could not load the item_nameid catalog ({}): {}",
                catalog.cache_path().display(),
                err
            ),
        }
    }

    tracker
        .validate()
        .with_context(|| format!("validating {}", config.config_path.display()))?;
    Ok(tracker)
}

/// Load the tracking configuration, open the database and wire the
/// orchestrator.
pub async fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let catalog = NameIdCatalog::cs2(&config.item_ids_cache);
    let tracker = load_tracker_config(config, &catalog).await?;
    let items = tracker.tracked_items()?;
    tracing::info!(
        "Loaded {} tracking items from {}",
        items.len(),
        config.config_path.display()
    );

    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone())?;
    let store = Arc::new(MarketDataRepository::new(pool, writer));

    let client = match &config.market_url {
        Some(url) => SteamMarketClient::with_base_url(url.clone()),
        None => SteamMarketClient::new(),
    };

    Ok(
        Orchestrator::new(tracker.budget(), items, Arc::new(client), store)
            .with_history_batch_size(config.history_batch_size)
            .with_minute_offset(config.history_minute),
    )
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub fn shutdown_signal() -> impl Future<Output = ()> + Send {
    async {
        let ctrl_c = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", err);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(err) => {
                    tracing::error!("Failed to listen for SIGTERM: {}", err);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
        tracing::info!("Shutdown signal received, stopping");
    }
}
