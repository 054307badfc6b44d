mod config;
mod main_lib;

use config::Config;
use main_lib::{build_orchestrator, init_tracing, shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    init_tracing();

    let orchestrator = build_orchestrator(&config).await?;
    orchestrator.run(shutdown_signal()).await?;

    tracing::info!("Steamtrack stopped");
    Ok(())
}
